//! In-memory fakes for pipeline tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::Document;
use tokio_util::sync::CancellationToken;

use crate::error::{ElasterError, ExportFailure, IndexError, Result, TeardownError};
use crate::index::{IndexResult, SearchIndex};
use crate::source::{DocumentCursor, DocumentSource};

use super::coordinator::{ExportState, ExportSummary};
use super::descriptor::ExportDescriptor;
use super::progress::ProgressEvent;
use super::report::ProgressReporter;

#[derive(Default)]
struct IndexState {
    calls: Vec<String>,
    created: Vec<(String, String, String, Document)>,
    write_attempts: usize,
}

#[derive(Default)]
struct IndexFailures {
    ping: Option<IndexError>,
    delete: Option<IndexError>,
    create_index: Option<IndexError>,
    mapping: Option<IndexError>,
    write_at: Option<(usize, IndexError)>,
    close: Option<IndexError>,
}

/// Recording destination index
#[derive(Clone, Default)]
pub struct MockIndex {
    state: Arc<Mutex<IndexState>>,
    failures: Arc<IndexFailures>,
    write_delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn failures_mut(&mut self) -> &mut IndexFailures {
        Arc::get_mut(&mut self.failures).expect("configure failures before cloning")
    }

    pub fn fail_ping(mut self, err: IndexError) -> Self {
        self.failures_mut().ping = Some(err);
        self
    }

    pub fn fail_delete(mut self, err: IndexError) -> Self {
        self.failures_mut().delete = Some(err);
        self
    }

    pub fn fail_create_index(mut self, err: IndexError) -> Self {
        self.failures_mut().create_index = Some(err);
        self
    }

    pub fn fail_mapping(mut self, err: IndexError) -> Self {
        self.failures_mut().mapping = Some(err);
        self
    }

    /// Fail the `n`th document write (1-based)
    pub fn fail_write_at(mut self, n: usize, err: IndexError) -> Self {
        self.failures_mut().write_at = Some((n, err));
        self
    }

    pub fn fail_close(mut self, err: IndexError) -> Self {
        self.failures_mut().close = Some(err);
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created(&self) -> Vec<(String, String, String, Document)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.created().into_iter().map(|(_, _, id, _)| id).collect()
    }

    pub fn write_attempts(&self) -> usize {
        self.state.lock().unwrap().write_attempts
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn outcome(err: &Option<IndexError>) -> IndexResult<()> {
        match err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchIndex for MockIndex {
    async fn ping(&self, timeout: Duration) -> IndexResult<()> {
        self.record(format!("ping {}ms", timeout.as_millis()));
        Self::outcome(&self.failures.ping)
    }

    async fn delete_index(&self, index: &str) -> IndexResult<()> {
        self.record(format!("delete {index}"));
        Self::outcome(&self.failures.delete)
    }

    async fn create_index(&self, index: &str) -> IndexResult<()> {
        self.record(format!("create {index}"));
        Self::outcome(&self.failures.create_index)
    }

    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        _mapping: &serde_json::Value,
    ) -> IndexResult<()> {
        self.record(format!("mapping {index}/{doc_type}"));
        Self::outcome(&self.failures.mapping)
    }

    async fn create_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Document,
    ) -> IndexResult<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let attempt = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("document {index}/{id}"));
            state.write_attempts += 1;
            state.write_attempts
        };

        match self.write_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some((n, err)) = &self.failures.write_at {
            if *n == attempt {
                return Err(err.clone());
            }
        }

        self.state.lock().unwrap().created.push((
            index.to_string(),
            doc_type.to_string(),
            id.to_string(),
            body.clone(),
        ));
        Ok(())
    }

    async fn close(&self) -> IndexResult<()> {
        self.record("close".to_string());
        Self::outcome(&self.failures.close)
    }
}

#[derive(Default)]
struct SourceState {
    pulled: HashMap<String, usize>,
    opened: Vec<String>,
    queries: Vec<(&'static str, Document)>,
    closed: usize,
}

/// In-memory document store
#[derive(Clone, Default)]
pub struct MockSource {
    collections: HashMap<String, Vec<Document>>,
    count_override: Option<u64>,
    fail_count: bool,
    fail_cursor_at: Option<usize>,
    fail_close: bool,
    state: Arc<Mutex<SourceState>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, docs: Vec<Document>) -> Self {
        self.collections.insert(name.to_string(), docs);
        self
    }

    /// Report `total` from `count` regardless of the stored documents
    pub fn with_count_override(mut self, total: u64) -> Self {
        self.count_override = Some(total);
        self
    }

    pub fn fail_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    /// Fail the `n`th cursor pull (1-based)
    pub fn fail_cursor_at(mut self, n: usize) -> Self {
        self.fail_cursor_at = Some(n);
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Documents handed out by cursors over `collection`
    pub fn pulled(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .pulled
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    /// Queries received, tagged with the calling operation ("count" or "open")
    pub fn queries(&self) -> Vec<(&'static str, Document)> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Stored documents of `collection` equal to `query` on every queried key
    fn matching(&self, collection: &str, query: &Document) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.iter().all(|(key, value)| doc.get(key) == Some(value)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn count(&self, collection: &str, query: &Document) -> Result<u64> {
        self.state
            .lock()
            .unwrap()
            .queries
            .push(("count", query.clone()));
        if self.fail_count {
            return Err(ElasterError::Generic("count failed".to_string()));
        }
        if let Some(total) = self.count_override {
            return Ok(total);
        }
        Ok(self.matching(collection, query).len() as u64)
    }

    async fn open(&self, collection: &str, query: &Document) -> Result<Box<dyn DocumentCursor>> {
        {
            let mut state = self.state.lock().unwrap();
            state.opened.push(collection.to_string());
            state.queries.push(("open", query.clone()));
        }
        let docs = self.matching(collection, query);
        Ok(Box::new(MockCursor {
            collection: collection.to_string(),
            docs: docs.into_iter(),
            pulls: 0,
            fail_at: self.fail_cursor_at,
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed += 1;
        if self.fail_close {
            return Err(ElasterError::Generic("connection reset".to_string()));
        }
        Ok(())
    }
}

struct MockCursor {
    collection: String,
    docs: std::vec::IntoIter<Document>,
    pulls: usize,
    fail_at: Option<usize>,
    state: Arc<Mutex<SourceState>>,
}

#[async_trait]
impl DocumentCursor for MockCursor {
    async fn next(&mut self) -> Result<Option<Document>> {
        self.pulls += 1;
        if self.fail_at == Some(self.pulls) {
            return Err(ElasterError::Generic("cursor killed".to_string()));
        }
        let doc = self.docs.next();
        if doc.is_some() {
            *self
                .state
                .lock()
                .unwrap()
                .pulled
                .entry(self.collection.clone())
                .or_default() += 1;
        }
        Ok(doc)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Recorded {
    started: Vec<String>,
    states: Vec<ExportState>,
    progress: Vec<ProgressEvent>,
    finished: Vec<ExportSummary>,
    failed: Vec<String>,
    teardown: Vec<String>,
}

/// Reporter that keeps every notification
#[derive(Default)]
pub struct RecordingReporter {
    recorded: Mutex<Recorded>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` once `n` progress events were seen
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.recorded.lock().unwrap().started.clone()
    }

    pub fn states(&self) -> Vec<ExportState> {
        self.recorded.lock().unwrap().states.clone()
    }

    pub fn progress_events(&self) -> Vec<ProgressEvent> {
        self.recorded.lock().unwrap().progress.clone()
    }

    pub fn finished(&self) -> Vec<ExportSummary> {
        self.recorded.lock().unwrap().finished.clone()
    }

    pub fn failed(&self) -> Vec<String> {
        self.recorded.lock().unwrap().failed.clone()
    }

    pub fn teardown(&self) -> Vec<String> {
        self.recorded.lock().unwrap().teardown.clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn collection_started(&self, desc: &ExportDescriptor) {
        self.recorded.lock().unwrap().started.push(desc.name.clone());
    }

    fn state_changed(&self, _collection: &str, state: ExportState) {
        self.recorded.lock().unwrap().states.push(state);
    }

    fn progress(&self, event: &ProgressEvent) {
        let seen = {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.progress.push(event.clone());
            recorded.progress.len()
        };
        if let Some((n, token)) = &self.cancel_after {
            if seen >= *n {
                token.cancel();
            }
        }
    }

    fn collection_finished(&self, summary: &ExportSummary) {
        self.recorded.lock().unwrap().finished.push(summary.clone());
    }

    fn collection_failed(&self, failure: &ExportFailure) {
        self.recorded.lock().unwrap().failed.push(failure.to_string());
    }

    fn teardown_failed(&self, error: &TeardownError) {
        self.recorded.lock().unwrap().teardown.push(error.to_string());
    }
}
