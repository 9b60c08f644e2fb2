//! BSON value conversion for the destination index
//!
//! Source documents arrive as BSON; Elasticsearch wants plain JSON bodies and
//! string document ids. Two strategies share the [`BsonConverter`] trait:
//! - [`JsonBodyConverter`]: BSON to plain JSON (no extended-JSON wrappers)
//! - [`IdConverter`]: BSON `_id` value to the string used as the document id

use mongodb::bson::{Bson, DateTime, Document, oid::ObjectId};
use serde_json::{Map, Value as JsonValue};

/// Core trait for BSON value conversion
pub trait BsonConverter {
    /// Output type of the conversion
    type Output;

    /// Convert a BSON value to the output type
    fn convert(&self, value: &Bson) -> Self::Output;

    /// Convert a BSON document
    fn convert_document(&self, doc: &Document) -> Self::Output {
        self.convert(&Bson::Document(doc.clone()))
    }
}

/// Converts BSON into the plain JSON sent as a document body
///
/// ObjectIds become hex strings, dates become RFC 3339 strings and decimals
/// become strings. Types without a natural JSON form fall back to relaxed
/// extended JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBodyConverter;

impl JsonBodyConverter {
    pub fn new() -> Self {
        Self
    }

    fn convert_datetime(&self, dt: &DateTime) -> JsonValue {
        match dt.try_to_rfc3339_string() {
            Ok(s) => JsonValue::String(s),
            Err(_) => JsonValue::Number(dt.timestamp_millis().into()),
        }
    }

    fn convert_object_id(&self, oid: &ObjectId) -> JsonValue {
        JsonValue::String(oid.to_hex())
    }

    fn convert_map(&self, doc: &Document) -> JsonValue {
        let map: Map<String, JsonValue> = doc
            .iter()
            .map(|(k, v)| (k.clone(), self.convert(v)))
            .collect();
        JsonValue::Object(map)
    }
}

impl BsonConverter for JsonBodyConverter {
    type Output = JsonValue;

    fn convert(&self, value: &Bson) -> JsonValue {
        match value {
            Bson::String(s) => JsonValue::String(s.clone()),
            Bson::Int32(n) => JsonValue::Number((*n).into()),
            Bson::Int64(n) => JsonValue::Number((*n).into()),
            Bson::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Bson::Boolean(b) => JsonValue::Bool(*b),
            Bson::Null | Bson::Undefined => JsonValue::Null,
            Bson::ObjectId(oid) => self.convert_object_id(oid),
            Bson::DateTime(dt) => self.convert_datetime(dt),
            Bson::Decimal128(d) => JsonValue::String(d.to_string()),
            Bson::Array(arr) => JsonValue::Array(arr.iter().map(|v| self.convert(v)).collect()),
            Bson::Document(doc) => self.convert_map(doc),
            other => other.clone().into_relaxed_extjson(),
        }
    }

    fn convert_document(&self, doc: &Document) -> JsonValue {
        self.convert_map(doc)
    }
}

/// Converts a document's `_id` into the destination document id
#[derive(Debug, Default, Clone, Copy)]
pub struct IdConverter;

impl IdConverter {
    pub fn new() -> Self {
        Self
    }
}

impl BsonConverter for IdConverter {
    type Output = String;

    fn convert(&self, value: &Bson) -> String {
        match value {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s.clone(),
            Bson::Int32(n) => n.to_string(),
            Bson::Int64(n) => n.to_string(),
            Bson::Double(f) => f.to_string(),
            Bson::Boolean(b) => b.to_string(),
            other => JsonBodyConverter.convert(other).to_string(),
        }
    }
}

/// Stringified `_id` of a source document, if it has one
pub fn document_id(doc: &Document) -> Option<String> {
    doc.get("_id").map(|id| IdConverter.convert(id))
}
