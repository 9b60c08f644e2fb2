//! Elasticsearch implementation of the destination index.
//!
//! Talks to the REST API directly:
//!
//! | call              | request                               |
//! |-------------------|---------------------------------------|
//! | `ping`            | `HEAD /`                              |
//! | `delete_index`    | `DELETE /{index}`                     |
//! | `create_index`    | `PUT /{index}`                        |
//! | `put_mapping`     | `PUT /{index}/_mapping/{type}`        |
//! | `create_document` | `PUT /{index}/{type}/{id}/_create`    |

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::Document;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info};
use url::Url;

use crate::convert::{BsonConverter, JsonBodyConverter};
use crate::error::IndexError;
use crate::utils::uri;

use super::{IndexResult, SearchIndex};

/// HTTP client for a single Elasticsearch node
pub struct ElasticClient {
    http: reqwest::Client,
    base: Url,
    converter: JsonBodyConverter,
    closed: AtomicBool,
}

impl ElasticClient {
    /// Create a client for the node at `host`
    ///
    /// # Arguments
    /// * `host` - Base URL, e.g. `http://localhost:9200`
    /// * `request_timeout` - Optional timeout applied to every request
    ///
    /// # Returns
    /// * `IndexResult<Self>` - New client or an invalid-URL error
    pub fn new(host: &str, request_timeout: Option<Duration>) -> IndexResult<Self> {
        let display_host = uri::sanitize(host);
        let base =
            Url::parse(host).map_err(|e| IndexError::InvalidUrl(format!("{display_host}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(IndexError::InvalidUrl(display_host));
        }

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("elaster/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        info!(url = %display_host, "Created Elasticsearch client");

        Ok(Self {
            http,
            base,
            converter: JsonBodyConverter::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Build a URL below the base from raw path segments
    ///
    /// Segments are percent-encoded, so ids containing `/` or `?` stay a
    /// single segment.
    fn url(&self, segments: &[&str]) -> IndexResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| IndexError::InvalidUrl(uri::sanitize(self.base.as_str())))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> IndexResult<RequestBuilder> {
        Ok(self.http.request(method, self.url(segments)?))
    }

    /// Turn a non-success response into an [`IndexError::Status`]
    async fn check(response: Response) -> IndexResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let reason = error_reason(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

        Err(IndexError::Status {
            status: status.as_u16(),
            reason,
        })
    }
}

/// Pull the human-readable reason out of an Elasticsearch error body
///
/// Handles both `{"error": {"reason": ..}}` and the older `{"error": ".."}` form.
fn error_reason(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => {
            let reason = obj.get("reason").and_then(JsonValue::as_str);
            let kind = obj.get("type").and_then(JsonValue::as_str);
            match (kind, reason) {
                (Some(kind), Some(reason)) => Some(format!("{kind}: {reason}")),
                (None, Some(reason)) => Some(reason.to_string()),
                (Some(kind), None) => Some(kind.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

#[async_trait]
impl SearchIndex for ElasticClient {
    async fn ping(&self, timeout: Duration) -> IndexResult<()> {
        let response = self
            .http
            .head(self.base.clone())
            .timeout(timeout)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Elasticsearch answered ping");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> IndexResult<()> {
        let response = self.request(Method::DELETE, &[index])?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IndexError::NotFound(index.to_string()));
        }

        Self::check(response).await?;
        debug!(index = %index, "Index deleted");
        Ok(())
    }

    async fn create_index(&self, index: &str) -> IndexResult<()> {
        let response = self.request(Method::PUT, &[index])?.send().await?;
        Self::check(response).await?;
        debug!(index = %index, "Index created");
        Ok(())
    }

    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &JsonValue,
    ) -> IndexResult<()> {
        let response = self
            .request(Method::PUT, &[index, "_mapping", doc_type])?
            .json(mapping)
            .send()
            .await?;
        Self::check(response).await?;
        debug!(index = %index, doc_type = %doc_type, "Mapping applied");
        Ok(())
    }

    async fn create_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Document,
    ) -> IndexResult<()> {
        let json = self.converter.convert_document(body);
        let response = self
            .request(Method::PUT, &[index, doc_type, id, "_create"])?
            .json(&json)
            .send()
            .await?;

        Self::check(response).await.inspect_err(|e| {
            error!(index = %index, id = %id, "Failed to create document: {}", e);
        })?;
        Ok(())
    }

    async fn close(&self) -> IndexResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed Elasticsearch client");
        }
        Ok(())
    }
}
