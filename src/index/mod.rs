//! Destination search index
//!
//! [`SearchIndex`] is everything the pipeline needs from the destination:
//! a reachability check, the index lifecycle calls and single-document
//! creation. Deleting a missing index is reported as the typed
//! [`IndexError::NotFound`] so callers never inspect error messages.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::IndexError;

pub mod elastic;

pub use elastic::ElasticClient;

/// Result type for destination index calls
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// A search index that receives exported documents
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Check the destination answers within `timeout`
    async fn ping(&self, timeout: Duration) -> IndexResult<()>;

    /// Delete `index`; [`IndexError::NotFound`] when it does not exist
    async fn delete_index(&self, index: &str) -> IndexResult<()>;

    /// Create an empty `index`
    async fn create_index(&self, index: &str) -> IndexResult<()>;

    /// Push `mapping` for `doc_type` on `index`
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &serde_json::Value,
    ) -> IndexResult<()>;

    /// Create one document; fails if the id already exists
    async fn create_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Document,
    ) -> IndexResult<()>;

    /// Release the connection
    async fn close(&self) -> IndexResult<()>;
}
