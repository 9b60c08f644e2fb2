//! Export coordinator: one collection, start to finish.
//!
//! The coordinator walks a fixed sequence of states:
//!
//! ```text
//! Idle -> CheckingConnectivity -> ResettingIndex -> ApplyingMapping
//!      -> Counting -> Streaming -> Done
//! ```
//!
//! Any stage error jumps straight to `Failed` with that stage's error and the
//! remaining stages are skipped. Streaming is a pull loop: take one document
//! from the cursor, project it, write it, count it, then take the next.

use std::fmt;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::convert::document_id;
use crate::error::ExportError;
use crate::index::SearchIndex;
use crate::source::DocumentSource;

use super::descriptor::ExportDescriptor;
use super::lifecycle::IndexLifecycle;
use super::progress::ProgressTracker;
use super::project::project;
use super::report::ProgressReporter;
use super::sink::ThrottledSink;

/// Position of one collection export in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExportState {
    Idle,
    CheckingConnectivity,
    ResettingIndex,
    ApplyingMapping,
    Counting,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportState::Idle => "idle",
            ExportState::CheckingConnectivity => "checking connectivity",
            ExportState::ResettingIndex => "resetting index",
            ExportState::ApplyingMapping => "applying mapping",
            ExportState::Counting => "counting",
            ExportState::Streaming => "streaming",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Result of a successful collection export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Source collection name
    pub collection: String,
    /// Destination index name
    pub index: String,
    /// Documents counted before streaming
    pub total: u64,
    /// Documents acknowledged by the destination
    pub exported: u64,
    /// Wall-clock time from the connectivity check to completion
    pub elapsed: Duration,
}

/// Drives the export of a single collection
pub struct ExportCoordinator<'a> {
    source: &'a dyn DocumentSource,
    index: &'a dyn SearchIndex,
    reporter: &'a dyn ProgressReporter,
    ping_timeout: Duration,
    cancel_token: Option<CancellationToken>,
    state: ExportState,
}

impl<'a> ExportCoordinator<'a> {
    /// Create a new export coordinator
    pub fn new(
        source: &'a dyn DocumentSource,
        index: &'a dyn SearchIndex,
        reporter: &'a dyn ProgressReporter,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            source,
            index,
            reporter,
            ping_timeout,
            cancel_token: None,
            state: ExportState::Idle,
        }
    }

    /// Set cancellation token for this export operation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Current state
    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Export `desc` and report the outcome
    ///
    /// # Returns
    /// * `Result<ExportSummary, ExportError>` - Statistics, or the first stage error
    pub async fn execute(&mut self, desc: &ExportDescriptor) -> Result<ExportSummary, ExportError> {
        let started = Instant::now();

        match self.run_stages(desc).await {
            Ok((total, exported)) => {
                self.transition(desc, ExportState::Done);
                let elapsed = started.elapsed();
                debug!(
                    "Export of [{}] completed: {} documents in {} ms",
                    desc.name,
                    exported,
                    elapsed.as_millis()
                );
                Ok(ExportSummary {
                    collection: desc.name.clone(),
                    index: desc.index.clone(),
                    total,
                    exported,
                    elapsed,
                })
            }
            Err(e) => {
                debug!("Export of [{}] failed during {}: {}", desc.name, self.state, e);
                self.transition(desc, ExportState::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self, desc: &ExportDescriptor) -> Result<(u64, u64), ExportError> {
        let lifecycle = IndexLifecycle::new(self.index, self.ping_timeout);

        self.enter(desc, ExportState::CheckingConnectivity)?;
        lifecycle.check_connectivity().await?;

        self.enter(desc, ExportState::ResettingIndex)?;
        lifecycle.reset_index(desc).await?;

        self.enter(desc, ExportState::ApplyingMapping)?;
        lifecycle.apply_mapping(desc).await?;

        self.enter(desc, ExportState::Counting)?;
        debug!("----> analyzing collection [{}]", desc.name);
        let total = self
            .source
            .count(&desc.name, &desc.query)
            .await
            .map_err(|e| ExportError::Count(e.to_string()))?;
        self.reporter.counted(&desc.name, total);

        self.enter(desc, ExportState::Streaming)?;
        let exported = self.stream(desc, total).await?;

        Ok((total, exported))
    }

    /// Pull, project, write and count documents until the cursor is exhausted
    async fn stream(&self, desc: &ExportDescriptor, total: u64) -> Result<u64, ExportError> {
        debug!("----> streaming collection [{}] to elastic", desc.name);

        let mut cursor = self
            .source
            .open(&desc.name, &desc.query)
            .await
            .map_err(|e| ExportError::Cursor(e.to_string()))?;
        let mut sink = ThrottledSink::new(self.index, &desc.index, &desc.doc_type);
        let mut tracker = ProgressTracker::new(&desc.name, total);

        let outcome = loop {
            if self.is_cancelled() {
                break Err(ExportError::Cancelled);
            }

            let doc = match cursor.next().await {
                Ok(Some(doc)) => doc,
                Ok(None) => break Ok(()),
                Err(e) => break Err(ExportError::Cursor(e.to_string())),
            };

            let Some(id) = document_id(&doc) else {
                break Err(ExportError::MissingId);
            };
            let body = project(doc, desc.fields.as_deref());

            if let Err(e) = sink.write(&id, body).await {
                break Err(e);
            }

            let event = tracker.observe();
            self.reporter.progress(&event);
        };

        if let Err(e) = cursor.close().await {
            warn!("Failed to close cursor on [{}]: {}", desc.name, e);
        }

        outcome.map(|()| sink.written())
    }

    /// Move to `next`, failing with `Cancelled` if the run was cancelled
    fn enter(&mut self, desc: &ExportDescriptor, next: ExportState) -> Result<(), ExportError> {
        if self.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        self.transition(desc, next);
        Ok(())
    }

    fn transition(&mut self, desc: &ExportDescriptor, next: ExportState) {
        debug_assert!(
            next > self.state || next == ExportState::Failed,
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("[{}] {} -> {}", desc.name, self.state, next);
        self.state = next;
        self.reporter.state_changed(&desc.name, next);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
