pub mod admission_format;
pub mod identifier_allocator;
pub mod import_diagnostics;
pub mod line_classifier;
pub mod offline_store;
pub mod question_assembler;
pub mod question_parser;
pub mod sync_reconciler;
pub mod text_extractor;
pub mod text_normalizer;
pub mod warn_writer;

pub use admission_format::AdmissionFormat;
pub use identifier_allocator::{
    AllocatorSettings, IdentifierStore, InsertOutcome, SequentialIdentifierAllocator,
};
pub use import_diagnostics::{ImportDiagnostics, ImportWarning};
pub use offline_store::OfflineStore;
pub use question_assembler::{OptionlessPolicy, QuestionAssembler};
pub use question_parser::QuestionParser;
pub use sync_reconciler::{MergeOutcome, SyncReconciler, SyncStore};
pub use text_extractor::{DocumentTextExtractor, TextExtractor};
pub use warn_writer::WarnWriter;
