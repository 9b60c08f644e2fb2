use std::{fmt, io};

use crate::error::mongo::extract_error_info;

/// Crate-wide `Result` type using [`ElasterError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ElasterError>;

/// Top-level error type for elaster operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ElasterError {
    /// A collection export failed; carries the collection and the stage.
    Export(ExportFailure),

    /// Closing the store or index connection failed after the run.
    Teardown(Vec<TeardownError>),

    /// Configuration errors.
    Config(ConfigError),

    /// Destination index errors outside of an export run.
    Index(IndexError),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Failure of a single pipeline stage, scoped to the current collection.
#[derive(Debug)]
pub enum ExportError {
    /// Destination did not answer the ping.
    Connectivity(String),

    /// Delete, create or mapping step failed.
    Lifecycle { step: LifecycleStep, cause: String },

    /// Source count query failed.
    Count(String),

    /// Source cursor failed while streaming.
    Cursor(String),

    /// A source document had no `_id` field.
    MissingId,

    /// A single document failed to write.
    Write { id: String, cause: String },

    /// The run was cancelled before this collection finished.
    Cancelled,
}

/// Lifecycle step that produced a [`ExportError::Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    DeleteIndex,
    CreateIndex,
    PutMapping,
}

/// Terminal failure report for one collection.
#[derive(Debug)]
pub struct ExportFailure {
    /// Source collection name from the descriptor.
    pub collection: String,

    /// Underlying cause.
    pub error: ExportError,
}

/// Errors reported by a destination index client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The addressed index does not exist.
    NotFound(String),

    /// The server answered with a non-success status.
    Status { status: u16, reason: String },

    /// The request could not be sent or the response not read.
    Transport(String),

    /// The request did not complete in time.
    Timeout,

    /// The configured host or a derived request URL is invalid.
    InvalidUrl(String),
}

/// Closing one of the run's connections failed.
#[derive(Debug)]
pub struct TeardownError {
    /// Which connection failed to close ("store" or "index").
    pub resource: &'static str,

    /// Underlying cause.
    pub cause: String,
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Helpers ========================= */

impl ExportError {
    /// Short label of the error kind, used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::Connectivity(_) => "ConnectivityError",
            ExportError::Lifecycle { .. } => "LifecycleError",
            ExportError::Count(_) => "CountError",
            ExportError::Cursor(_) => "CursorError",
            ExportError::MissingId => "WriteError",
            ExportError::Write { .. } => "WriteError",
            ExportError::Cancelled => "Cancelled",
        }
    }
}

impl ExportFailure {
    pub fn new(collection: impl Into<String>, error: ExportError) -> Self {
        Self {
            collection: collection.into(),
            error,
        }
    }
}

impl IndexError {
    /// Whether this is the typed "index does not exist" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound(_))
    }
}

/// One-line description of a MongoDB driver error.
fn describe_mongodb_error(err: &mongodb::error::Error) -> String {
    let info = extract_error_info(err);
    match (info.name.as_deref(), info.message.as_deref()) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (None, Some(message)) => message.to_string(),
        _ => err.to_string(),
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ElasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElasterError::Export(e) => write!(f, "{e}"),
            ElasterError::Teardown(errors) => {
                write!(f, "Teardown failed: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            ElasterError::Config(e) => write!(f, "Configuration error: {e}"),
            ElasterError::Index(e) => write!(f, "Index error: {e}"),
            ElasterError::MongoDb(e) => write!(f, "MongoDB error: {}", describe_mongodb_error(e)),
            ElasterError::Io(e) => write!(f, "I/O error: {e}"),
            ElasterError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Connectivity(msg) => {
                write!(f, "ConnectivityError: elastic is unreachable: {msg}")
            }
            ExportError::Lifecycle { step, cause } => {
                write!(f, "LifecycleError: {step} failed: {cause}")
            }
            ExportError::Count(msg) => write!(f, "CountError: {msg}"),
            ExportError::Cursor(msg) => write!(f, "CursorError: {msg}"),
            ExportError::MissingId => write!(f, "WriteError: document has no _id"),
            ExportError::Write { id, cause } => {
                write!(f, "WriteError: failed to create document {id}: {cause}")
            }
            ExportError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStep::DeleteIndex => write!(f, "delete index"),
            LifecycleStep::CreateIndex => write!(f, "create index"),
            LifecycleStep::PutMapping => write!(f, "put mapping"),
        }
    }
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "collection [{}] - failed to export: {}",
            self.collection, self.error
        )
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::NotFound(index) => write!(f, "index [{index}] does not exist"),
            IndexError::Status { status, reason } => write!(f, "status {status}: {reason}"),
            IndexError::Transport(msg) => write!(f, "request failed: {msg}"),
            IndexError::Timeout => write!(f, "request timed out"),
            IndexError::InvalidUrl(msg) => write!(f, "invalid url: {msg}"),
        }
    }
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to close {} connection: {}", self.resource, self.cause)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for ElasterError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ExportFailure {}
impl std::error::Error for IndexError {}
impl std::error::Error for TeardownError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ElasterError ========================= */

impl From<io::Error> for ElasterError {
    fn from(err: io::Error) -> Self {
        ElasterError::Io(err)
    }
}

impl From<mongodb::error::Error> for ElasterError {
    fn from(err: mongodb::error::Error) -> Self {
        ElasterError::MongoDb(err)
    }
}

impl From<ExportFailure> for ElasterError {
    fn from(err: ExportFailure) -> Self {
        ElasterError::Export(err)
    }
}

impl From<IndexError> for ElasterError {
    fn from(err: IndexError) -> Self {
        ElasterError::Index(err)
    }
}

impl From<ConfigError> for ElasterError {
    fn from(err: ConfigError) -> Self {
        ElasterError::Config(err)
    }
}

impl From<String> for ElasterError {
    fn from(msg: String) -> Self {
        ElasterError::Generic(msg)
    }
}

impl From<&str> for ElasterError {
    fn from(msg: &str) -> Self {
        ElasterError::Generic(msg.to_owned())
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IndexError::Timeout
        } else {
            IndexError::Transport(err.to_string())
        }
    }
}
