//! Core domain types for crawl output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single record field: either a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// `true` for an empty string or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// Borrow the string value, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Borrow the list value, if this is a list field.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Named fields of a record, ordered by name.
pub type Fields = BTreeMap<String, FieldValue>;

/// Keys the record itself serializes; extractor fields may not use them.
pub const RESERVED_FIELDS: [&str; 2] = ["url", "source_page"];

fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One unit of extracted content, identified by its URL.
///
/// Records are built by an extractor, optionally completed from a detail
/// page, and then handed to the crawl output. Once in the output they are
/// never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifying URL; at most one record per URL per crawl.
    pub url: String,
    /// The crawled page the record was first discovered on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<String>,
    /// Extractor-specific fields.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_page: None,
            fields: Fields::new(),
        }
    }

    /// Builder-style field setter. Reserved names are ignored.
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        if is_reserved(name) {
            tracing::debug!(field = name, "reserved field name, ignoring");
            return self;
        }
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Look up a text field by name.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// Copy every non-empty field from `other` into fields that are missing
    /// or empty here. Existing non-empty values win.
    pub fn fill_missing(&mut self, other: Fields) {
        for (name, value) in other {
            if value.is_empty() || is_reserved(&name) {
                continue;
            }
            match self.fields.get(&name) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    self.fields.insert(name, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_flat() {
        let record = Record::new("https://example.com/news/a")
            .with_field("title", "Launch day")
            .with_field("authors", vec!["Ada".to_string(), "Grace".to_string()]);

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["url"], "https://example.com/news/a");
        assert_eq!(json["title"], "Launch day");
        assert_eq!(json["authors"][1], "Grace");
        assert!(json.get("source_page").is_none());
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn record_deserializes_mixed_fields() {
        let json = r#"{
            "url": "https://example.com/post/1",
            "source_page": "https://example.com/",
            "title": "Hello",
            "authors": ["One", "Two"]
        }"#;
        let record: Record = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.source_page.as_deref(), Some("https://example.com/"));
        assert_eq!(record.text("title"), Some("Hello"));
        assert_eq!(
            record.field("authors").and_then(FieldValue::as_list),
            Some(&["One".to_string(), "Two".to_string()][..])
        );
    }

    #[test]
    fn fill_missing_keeps_existing_values() {
        let mut record = Record::new("u")
            .with_field("date_posted", "Apr 3, 2025")
            .with_field("authors", Vec::<String>::new())
            .with_field("full_article", "");

        let mut detail = Fields::new();
        detail.insert("date_posted".into(), "Apr 4, 2025".into());
        detail.insert("authors".into(), vec!["Ada".to_string()].into());
        detail.insert("full_article".into(), "Body text".into());
        detail.insert("updates".into(), "".into());

        record.fill_missing(detail);

        assert_eq!(record.text("date_posted"), Some("Apr 3, 2025"));
        assert_eq!(
            record.field("authors"),
            Some(&FieldValue::List(vec!["Ada".into()]))
        );
        assert_eq!(record.text("full_article"), Some("Body text"));
        assert!(record.field("updates").is_none());
    }

    #[test]
    fn reserved_names_never_shadow_record_keys() {
        let mut record = Record::new("https://example.com/news/a")
            .with_field("url", "https://other.example.com/")
            .with_field("source_page", "elsewhere")
            .with_field("title", "Kept");

        let mut detail = Fields::new();
        detail.insert("url".into(), "https://detail.example.com/".into());
        record.fill_missing(detail);

        assert!(record.field("url").is_none());
        assert!(record.field("source_page").is_none());

        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(json.matches("\"url\"").count(), 1);
        assert!(json.contains("\"url\":\"https://example.com/news/a\""));
        assert!(!json.contains("source_page"));
    }
}
