//! Export pipeline: copy collections from the document store into the search index
//!
//! Each collection moves through the same chain of stages:
//!
//! 1. **IndexLifecycle**: ping the destination, drop and recreate the target
//!    index, then push the optional mapping
//! 2. **Count**: compute the number of documents matching the descriptor query
//! 3. **Stream**: pull documents one at a time from a cursor sorted by `_id`
//! 4. **project**: keep only the configured fields
//! 5. **ThrottledSink**: write the document and wait for the acknowledgment
//! 6. **ProgressTracker**: turn each acknowledgment into a progress event
//!
//! The **ExportCoordinator** drives these stages for one collection and the
//! **Orchestrator** runs a queue of coordinators over a single pair of
//! connections, closing both when the queue ends.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # use elaster::config::MongoConfig;
//! # use elaster::index::ElasticClient;
//! # use elaster::pipeline::{ExportDescriptor, LogReporter, Orchestrator};
//! # use elaster::source::MongoSource;
//! # async fn run() -> elaster::error::Result<()> {
//! let source = MongoSource::connect(&MongoConfig::default()).await?;
//! let index = ElasticClient::new("http://localhost:9200", None)?;
//!
//! let report = Orchestrator::new(
//!     Box::new(source),
//!     Box::new(index),
//!     Arc::new(LogReporter::new()),
//!     Duration::from_millis(1000),
//! )
//! .run(&[ExportDescriptor::new("users", "users_idx", "user")])
//! .await;
//!
//! report.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod descriptor;
pub mod lifecycle;
pub mod orchestrator;
pub mod progress;
pub mod project;
pub mod report;
pub mod sink;

#[cfg(test)]
pub(crate) mod mock;

pub use coordinator::{ExportCoordinator, ExportState, ExportSummary};
pub use descriptor::ExportDescriptor;
pub use lifecycle::IndexLifecycle;
pub use orchestrator::{Orchestrator, RunReport};
pub use progress::{ProgressEvent, ProgressTracker};
pub use project::project;
pub use report::{BarReporter, LogReporter, ProgressReporter};
pub use sink::ThrottledSink;
