//! Throttled sink: the terminal write stage of the pipeline.
//!
//! One `create_document` call is outstanding at a time. [`ThrottledSink::write`]
//! only returns after the destination acknowledges, and the caller does not pull
//! the next document from the cursor until it does, so the cursor is throttled
//! by the destination's pace.

use mongodb::bson::Document;
use tracing::trace;

use crate::error::ExportError;
use crate::index::SearchIndex;

/// Writes one document at a time to a destination index
pub struct ThrottledSink<'a> {
    index: &'a dyn SearchIndex,
    index_name: &'a str,
    doc_type: &'a str,
    written: u64,
}

impl<'a> ThrottledSink<'a> {
    /// Create a sink writing into `index_name` with type `doc_type`
    pub fn new(index: &'a dyn SearchIndex, index_name: &'a str, doc_type: &'a str) -> Self {
        Self {
            index,
            index_name,
            doc_type,
            written: 0,
        }
    }

    /// Write one document and wait for the acknowledgment
    ///
    /// `id` travels in the request path; any `_id` key left in the body is
    /// dropped because the destination treats it as metadata. On success the
    /// body is handed back for the next stage.
    ///
    /// # Arguments
    /// * `id` - Stringified `_id` of the source document
    /// * `body` - Projected document
    ///
    /// # Returns
    /// * `Result<Document, ExportError>` - The acknowledged body or a write error
    pub async fn write(&mut self, id: &str, mut body: Document) -> Result<Document, ExportError> {
        body.remove("_id");

        self.index
            .create_document(self.index_name, self.doc_type, id, &body)
            .await
            .map_err(|e| ExportError::Write {
                id: id.to_string(),
                cause: e.to_string(),
            })?;

        self.written += 1;
        trace!("Document {} acknowledged ({} written)", id, self.written);
        Ok(body)
    }

    /// Number of acknowledged writes
    pub fn written(&self) -> u64 {
        self.written
    }
}
