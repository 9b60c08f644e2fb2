//! Field projection stage.

use mongodb::bson::Document;

/// Narrow a document to the requested fields
///
/// With `fields` unset the document is returned untouched. Otherwise the result
/// holds only the requested keys that exist on `doc`, in the document's own key
/// order. Unknown fields are silently absent.
pub fn project(doc: Document, fields: Option<&[String]>) -> Document {
    let Some(fields) = fields else {
        return doc;
    };

    doc.into_iter()
        .filter(|(key, _)| fields.iter().any(|f| f == key))
        .collect()
}
