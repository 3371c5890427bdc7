pub mod database;
pub mod paper_store;
pub mod student_store;
pub mod sync_store;

pub use database::Database;
pub use paper_store::PaperStore;
pub use student_store::StudentStore;
pub use sync_store::ServerSyncStore;
