//! MongoDB implementation of the document source.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Cursor, Database};
use tracing::{debug, info};

use crate::config::MongoConfig;
use crate::error::{ConfigError, Result, error_summary};
use crate::utils::uri;

use super::{DocumentCursor, DocumentSource};

/// Application name reported to the server.
const APP_NAME: &str = "elaster";

/// MongoDB-backed [`DocumentSource`]
///
/// Holds one client for the whole run; every collection export shares it.
pub struct MongoSource {
    client: Client,
    database: Database,
    batch_size: u32,
    closed: AtomicBool,
}

impl MongoSource {
    /// Connect to MongoDB
    ///
    /// The database is taken from `config.database`, falling back to the
    /// database named in the connection URI.
    ///
    /// # Arguments
    /// * `config` - MongoDB connection configuration
    ///
    /// # Returns
    /// * `Result<Self>` - Connected source or error
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.connection).await?;
        let timeout = config.timeout();
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)?;

        let database = match &config.database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .ok_or_else(|| ConfigError::MissingField("mongo.database".to_string()))?,
        };

        info!(
            "Connected to {} (database: {})",
            uri::sanitize(&config.connection),
            database.name()
        );

        Ok(Self {
            client,
            database,
            batch_size: config.batch_size,
            closed: AtomicBool::new(false),
        })
    }

    /// Name of the database collections are read from
    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl DocumentSource for MongoSource {
    async fn count(&self, collection: &str, query: &Document) -> Result<u64> {
        let total = self
            .database
            .collection::<Document>(collection)
            .count_documents(query.clone())
            .await
            .inspect_err(|e| debug!("Count on [{}] failed: {}", collection, error_summary(e)))?;
        Ok(total)
    }

    async fn open(&self, collection: &str, query: &Document) -> Result<Box<dyn DocumentCursor>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(query.clone())
            .sort(doc! { "_id": 1 })
            .batch_size(self.batch_size)
            .await
            .inspect_err(|e| debug!("Find on [{}] failed: {}", collection, error_summary(e)))?;

        debug!("Opened cursor on [{}] sorted by _id", collection);
        Ok(Box::new(MongoCursor::new(cursor, collection)))
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.client.clone().shutdown().await;
            debug!("Closed MongoDB client");
        }
        Ok(())
    }
}

/// Cursor over one collection's sorted query
pub struct MongoCursor {
    cursor: Option<Cursor<Document>>,
    collection: String,
    total_fetched: u64,
}

impl MongoCursor {
    /// Wrap a driver cursor
    ///
    /// # Arguments
    /// * `cursor` - MongoDB cursor from a find operation
    /// * `collection` - Collection name for logging
    pub fn new(cursor: Cursor<Document>, collection: &str) -> Self {
        Self {
            cursor: Some(cursor),
            collection: collection.to_string(),
            total_fetched: 0,
        }
    }
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn next(&mut self) -> Result<Option<Document>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };

        match cursor.try_next().await {
            Ok(Some(doc)) => {
                self.total_fetched += 1;
                Ok(Some(doc))
            }
            Ok(None) => {
                debug!(
                    "Cursor on [{}] exhausted after {} documents",
                    self.collection, self.total_fetched
                );
                self.cursor = None;
                Ok(None)
            }
            Err(e) => {
                debug!(
                    "Cursor on [{}] failed after {} documents: {}",
                    self.collection,
                    self.total_fetched,
                    error_summary(&e)
                );
                // On error, drop cursor to release resources
                self.cursor = None;
                Err(e.into())
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.cursor.take().is_some() {
            debug!(
                "Closed cursor on [{}] after fetching {} documents",
                self.collection, self.total_fetched
            );
        }
        Ok(())
    }
}

impl Drop for MongoCursor {
    fn drop(&mut self) {
        if self.cursor.is_some() {
            debug!("MongoCursor on [{}] dropped without explicit close", self.collection);
        }
    }
}
