//! Run orchestration: a queue of collection exports over one pair of connections.
//!
//! Descriptors are exported one after another in configuration order. The
//! first failure stops the queue; the remaining descriptors are recorded as
//! skipped. Both connections are closed after the queue ends, whatever the
//! outcome, and a close failure never replaces the export failure.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ElasterError, ExportFailure, TeardownError};
use crate::index::SearchIndex;
use crate::source::DocumentSource;

use super::coordinator::{ExportCoordinator, ExportSummary};
use super::descriptor::ExportDescriptor;
use super::report::ProgressReporter;

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Collections exported successfully, in order
    pub completed: Vec<ExportSummary>,
    /// The export that stopped the queue, if any
    pub failure: Option<ExportFailure>,
    /// Collections never attempted because of `failure`
    pub skipped: Vec<String>,
    /// Connection close failures
    pub teardown: Vec<TeardownError>,
}

impl RunReport {
    /// Whether every descriptor exported and both connections closed
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.teardown.is_empty()
    }

    /// Process exit code
    ///
    /// # Returns
    /// * `0` - Everything succeeded
    /// * `1` - An export failed
    /// * `2` - Exports succeeded but a connection failed to close
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            1
        } else if !self.teardown.is_empty() {
            2
        } else {
            0
        }
    }

    /// Collapse into a single result; the export failure wins over teardown
    pub fn into_result(self) -> crate::error::Result<Vec<ExportSummary>> {
        if let Some(failure) = self.failure {
            return Err(ElasterError::Export(failure));
        }
        if !self.teardown.is_empty() {
            return Err(ElasterError::Teardown(self.teardown));
        }
        Ok(self.completed)
    }
}

/// Owns the run's connections and exports a queue of descriptors
pub struct Orchestrator {
    source: Box<dyn DocumentSource>,
    index: Box<dyn SearchIndex>,
    reporter: Arc<dyn ProgressReporter>,
    ping_timeout: Duration,
    cancel_token: Option<CancellationToken>,
}

impl Orchestrator {
    /// Create an orchestrator over already-connected endpoints
    ///
    /// # Arguments
    /// * `source` - Store the collections are read from
    /// * `index` - Destination search index
    /// * `reporter` - Receives progress and status notifications
    /// * `ping_timeout` - Connectivity check budget per collection
    pub fn new(
        source: Box<dyn DocumentSource>,
        index: Box<dyn SearchIndex>,
        reporter: Arc<dyn ProgressReporter>,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            source,
            index,
            reporter,
            ping_timeout,
            cancel_token: None,
        }
    }

    /// Set cancellation token for the run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Export every descriptor in order, then close both connections
    pub async fn run(self, descriptors: &[ExportDescriptor]) -> RunReport {
        let mut report = RunReport::default();

        for (pos, desc) in descriptors.iter().enumerate() {
            self.reporter.collection_started(desc);

            let mut coordinator = ExportCoordinator::new(
                self.source.as_ref(),
                self.index.as_ref(),
                self.reporter.as_ref(),
                self.ping_timeout,
            );
            if let Some(token) = &self.cancel_token {
                coordinator = coordinator.with_cancellation(token.clone());
            }

            match coordinator.execute(desc).await {
                Ok(summary) => {
                    self.reporter.collection_finished(&summary);
                    report.completed.push(summary);
                }
                Err(error) => {
                    let failure = ExportFailure::new(&desc.name, error);
                    self.reporter.collection_failed(&failure);
                    report.skipped = descriptors[pos + 1..]
                        .iter()
                        .map(|d| d.name.clone())
                        .collect();
                    if !report.skipped.is_empty() {
                        warn!(
                            "Skipping {} remaining collection(s): {}",
                            report.skipped.len(),
                            report.skipped.join(", ")
                        );
                    }
                    report.failure = Some(failure);
                    break;
                }
            }
        }

        report.teardown = self.teardown().await;
        info!(
            "Run finished: {} exported, {} failed, {} skipped",
            report.completed.len(),
            usize::from(report.failure.is_some()),
            report.skipped.len()
        );
        report
    }

    /// Close both connections concurrently, collecting every failure
    async fn teardown(&self) -> Vec<TeardownError> {
        let (store, index) = tokio::join!(self.source.close(), self.index.close());

        let mut errors = Vec::new();
        if let Err(e) = store {
            errors.push(TeardownError {
                resource: "store",
                cause: e.to_string(),
            });
        }
        if let Err(e) = index {
            errors.push(TeardownError {
                resource: "index",
                cause: e.to_string(),
            });
        }

        for err in &errors {
            self.reporter.teardown_failed(err);
        }
        errors
    }
}
