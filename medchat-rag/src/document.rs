//! Data types for retrieved passages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata field holding the passage text.
pub const TEXT_KEY: &str = "text";
/// Metadata field holding an explicit citation label.
pub const SOURCE_KEY: &str = "source";
/// Metadata field holding the page number in the reference manual.
pub const PAGE_KEY: &str = "page";
/// Metadata field holding the id of the ingested source document.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// A passage returned by the vector store for a query vector.
///
/// The metadata mapping is kept as raw JSON because the ingestion side
/// decides its shape; accessors below pick out the fields the assembler
/// understands and ignore the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    /// Identifier of the stored vector.
    pub id: String,
    /// The similarity score (higher is more relevant).
    #[serde(default)]
    pub score: f32,
    /// Metadata stored alongside the vector.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchMatch {
    /// Create a match with no metadata.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self { id: id.into(), score, metadata: Map::new() }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The passage text, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.non_empty_str(TEXT_KEY)
    }

    /// The explicit citation label, if present and non-empty.
    pub fn source(&self) -> Option<&str> {
        self.non_empty_str(SOURCE_KEY)
    }

    /// The id of the source document, if present.
    pub fn document_id(&self) -> Option<&str> {
        self.non_empty_str(DOCUMENT_ID_KEY)
    }

    /// The page number rendered for display.
    ///
    /// Vector stores commonly return numeric metadata as floats, so `10.0`
    /// renders as `"10"`. String pages are passed through.
    pub fn page(&self) -> Option<String> {
        match self.metadata.get(PAGE_KEY)? {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(i.to_string())
                } else if let Some(u) = n.as_u64() {
                    Some(u.to_string())
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some((f as i64).to_string())
                    } else {
                        Some(f.to_string())
                    }
                }
            }
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_text_is_treated_as_missing() {
        let m = SearchMatch::new("a", 0.9).with_metadata(TEXT_KEY, "   ");
        assert_eq!(m.text(), None);
    }

    #[test]
    fn non_string_text_is_treated_as_missing() {
        let m = SearchMatch::new("a", 0.9).with_metadata(TEXT_KEY, 42);
        assert_eq!(m.text(), None);
    }

    #[test]
    fn integral_float_pages_render_without_decimals() {
        let m = SearchMatch::new("a", 0.9).with_metadata(PAGE_KEY, json!(10.0));
        assert_eq!(m.page().as_deref(), Some("10"));

        let m = SearchMatch::new("a", 0.9).with_metadata(PAGE_KEY, json!(12));
        assert_eq!(m.page().as_deref(), Some("12"));

        let m = SearchMatch::new("a", 0.9).with_metadata(PAGE_KEY, json!(3.5));
        assert_eq!(m.page().as_deref(), Some("3.5"));
    }

    #[test]
    fn string_pages_pass_through() {
        let m = SearchMatch::new("a", 0.9).with_metadata(PAGE_KEY, "xii");
        assert_eq!(m.page().as_deref(), Some("xii"));
    }

    #[test]
    fn deserializes_store_payload_without_metadata() {
        let m: SearchMatch = serde_json::from_value(json!({"id": "vec-1", "score": 0.5})).unwrap();
        assert_eq!(m.id, "vec-1");
        assert!(m.metadata.is_empty());
    }
}
