//! Error handling for the re-indexing pipeline.
//!
//! Every pipeline stage reports a typed [`ExportError`]; the orchestrator tags
//! it with the collection name as an [`ExportFailure`]. Connection teardown
//! problems are collected separately as [`TeardownError`]s so they never hide
//! an export failure.

pub mod kinds;
pub mod mongo;

// Re-export commonly used types
pub use kinds::{
    ConfigError, ElasterError, ExportError, ExportFailure, IndexError, LifecycleStep, Result,
    TeardownError,
};
pub use mongo::{ErrorInfo, error_summary, extract_error_info};
