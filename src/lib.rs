//! elaster library
//!
//! Re-indexes MongoDB collections into Elasticsearch. Each configured
//! collection gets a freshly recreated index, an optional mapping and a
//! document-by-document copy of the matching source documents.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `convert`: BSON to JSON conversion for index bodies and ids
//! - `error`: Error types and handling
//! - `index`: Destination search index (Elasticsearch REST client)
//! - `pipeline`: Export pipeline and run orchestration
//! - `source`: Source document store (MongoDB)
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use elaster::{Config, ElasticClient, LogReporter, MongoSource, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_from_file(None)?;
//!     let source = MongoSource::connect(&config.mongo).await?;
//!     let index = ElasticClient::new(&config.elastic.host, config.request_timeout())?;
//!
//!     let report = Orchestrator::new(
//!         Box::new(source),
//!         Box::new(index),
//!         Arc::new(LogReporter::new()),
//!         config.ping_timeout(),
//!     )
//!     .run(&config.collections)
//!     .await;
//!
//!     std::process::exit(report.exit_code());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ElasterError, Result};
pub use index::{ElasticClient, SearchIndex};
pub use pipeline::{
    BarReporter, ExportDescriptor, LogReporter, Orchestrator, ProgressReporter, RunReport,
};
pub use source::{DocumentSource, MongoSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
