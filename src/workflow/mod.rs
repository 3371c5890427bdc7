pub mod enrollment_flow;
pub mod import_ctx;
pub mod import_flow;

pub use enrollment_flow::EnrollmentFlow;
pub use import_ctx::ImportCtx;
pub use import_flow::{ImportFlow, ImportOutcome};
