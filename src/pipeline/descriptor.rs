//! Export descriptors: what to copy from which collection into which index.

use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// Configuration for exporting one source collection into one destination index
///
/// ```toml
/// [[collections]]
/// name = "users"
/// index = "users_idx"
/// type = "user"
/// query = { active = true }
/// fields = ["name", "email"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDescriptor {
    /// Source collection name
    pub name: String,

    /// Destination index name
    pub index: String,

    /// Destination document type
    #[serde(rename = "type")]
    pub doc_type: String,

    /// Filter applied to both the count and the cursor; empty matches all
    #[serde(default)]
    pub query: Document,

    /// Fields kept in each document body; unset keeps everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    /// Mapping pushed for `doc_type` after the index is recreated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<serde_json::Value>,
}

impl ExportDescriptor {
    /// Match-all descriptor with no projection and no mapping
    pub fn new(
        name: impl Into<String>,
        index: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index: index.into(),
            doc_type: doc_type.into(),
            query: Document::new(),
            fields: None,
            mappings: None,
        }
    }

    pub fn with_query(mut self, query: Document) -> Self {
        self.query = query;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_mappings(mut self, mappings: serde_json::Value) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Check required fields, returning the name of the first invalid one
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name");
        }
        if self.index.trim().is_empty() {
            return Err("index");
        }
        if self.doc_type.trim().is_empty() {
            return Err("type");
        }
        if matches!(&self.fields, Some(fields) if fields.is_empty()) {
            return Err("fields");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_builder() {
        let desc = ExportDescriptor::new("users", "users_idx", "user")
            .with_query(doc! { "active": true })
            .with_fields(["name"]);

        assert_eq!(desc.query, doc! { "active": true });
        assert_eq!(desc.fields, Some(vec!["name".to_string()]));
        assert!(desc.mappings.is_none());
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert_eq!(ExportDescriptor::new("", "i", "t").validate(), Err("name"));
        assert_eq!(ExportDescriptor::new("n", " ", "t").validate(), Err("index"));
        assert_eq!(ExportDescriptor::new("n", "i", "").validate(), Err("type"));
        assert_eq!(
            ExportDescriptor::new("n", "i", "t")
                .with_fields(Vec::<String>::new())
                .validate(),
            Err("fields")
        );
    }
}
