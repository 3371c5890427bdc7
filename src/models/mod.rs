pub mod document;
pub mod identifier;
pub mod loaders;
pub mod question;
pub mod student;
pub mod sync;

pub use document::{DocumentKind, RawDocument};
pub use identifier::{SequentialIdentifier, SerialKind};
pub use loaders::{load_all_documents, load_all_sync_batches, load_document, load_sync_batch};
pub use question::{ImportResult, OptionLetter, ParsedQuestion};
pub use student::{NewStudent, Student};
pub use sync::{DeletedStudent, DownloadSnapshot, ExamSnapshot, OfflineExam, OfflineResult, StudentSnapshot, SyncBatch, SyncReceipt};
