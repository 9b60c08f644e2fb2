//! Source document store
//!
//! The pipeline reads through two small traits so the store can be swapped
//! (MongoDB in production, in-memory fakes in tests):
//!
//! - [`DocumentSource`]: count and open a sorted cursor over a collection
//! - [`DocumentCursor`]: a lazy, ordered sequence of documents
//!
//! Cursors are pulled one document at a time; nothing is read from the store
//! until the pipeline asks for the next document.

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::Result;

pub mod mongo;

pub use mongo::{MongoCursor, MongoSource};

/// A store holding the collections to export
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Number of documents in `collection` matching `query`
    async fn count(&self, collection: &str, query: &Document) -> Result<u64>;

    /// Open a cursor over `collection` matching `query`, ascending by `_id`
    async fn open(&self, collection: &str, query: &Document) -> Result<Box<dyn DocumentCursor>>;

    /// Close the store connection
    async fn close(&self) -> Result<()>;
}

/// Ordered, lazy sequence of documents
#[async_trait]
pub trait DocumentCursor: Send {
    /// Fetch the next document
    ///
    /// # Returns
    /// * `Result<Option<Document>>` - Next document, or None when exhausted
    async fn next(&mut self) -> Result<Option<Document>>;

    /// Release the cursor's server resources
    async fn close(&mut self) -> Result<()>;
}
