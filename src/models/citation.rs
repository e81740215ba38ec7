//! Citation records as returned by the DOI resolver.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One CSL-JSON citation document.
///
/// The document is never interpreted or modified: serializing a record yields
/// exactly what the resolver sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationRecord(Value);

impl CitationRecord {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Parse a response body
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body).map(Self)
    }

    /// Borrow the raw document
    pub fn document(&self) -> &Value {
        &self.0
    }

    pub fn into_document(self) -> Value {
        self.0
    }

    /// Look up a top-level string field, e.g. `title` or `DOI`.
    ///
    /// Only used for display; the fetcher itself never reads fields.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Value> for CitationRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
