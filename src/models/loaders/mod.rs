pub mod document_loader;
pub mod sync_loader;

pub use document_loader::{load_all_documents, load_document};
pub use sync_loader::{load_all_sync_batches, load_sync_batch};
