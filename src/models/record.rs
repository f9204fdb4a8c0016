// src/models/record.rs

//! Record kinds and the produced-record envelope.
//!
//! The scraping collaborators emit one [`Record`] per parsed page entity.
//! This subsystem only inspects the kind and the source URL; the field list
//! rides along for the export collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of record kinds the scrapers produce.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A board/forum listing entity
    Forum,
    /// A topic that is still receiving comments
    ActiveTopic,
    /// A topic moved to the archive
    ArchivedTopic,
    /// A comment on an active topic
    ActiveComment,
    /// A comment on an archived topic
    ArchivedComment,
    /// A blog article
    Article,
}

impl RecordKind {
    /// Stable name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Forum => "forum",
            RecordKind::ActiveTopic => "active_topic",
            RecordKind::ArchivedTopic => "archived_topic",
            RecordKind::ActiveComment => "active_comment",
            RecordKind::ArchivedComment => "archived_comment",
            RecordKind::Article => "article",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A scalar text field
    Text(String),
    /// A multi-valued field, e.g. image URLs of a comment
    List(Vec<String>),
}

/// A parsed record produced from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// What the scraper parsed this into
    pub kind: RecordKind,
    /// URL of the response the record came from
    pub url: String,
    /// Fields in the order the scraper filled them
    #[serde(default)]
    pub fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create a record with no fields yet.
    pub fn new(kind: RecordKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, keeping insertion order.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_serde() {
        let json = serde_json::to_string(&RecordKind::ArchivedTopic).unwrap();
        assert_eq!(json, r#""archived_topic""#);

        let back: RecordKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RecordKind::ArchivedTopic);
    }

    #[test]
    fn record_fields_keep_order() {
        let record = Record::new(RecordKind::ActiveComment, "https://host.example/c/1")
            .with_field("user_name", FieldValue::Text("anon".into()))
            .with_field(
                "image_urls",
                FieldValue::List(vec!["https://img.example/1.png".into()]),
            );

        let names: Vec<_> = record.fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["user_name", "image_urls"]);
        assert_eq!(
            record.field("user_name"),
            Some(&FieldValue::Text("anon".into()))
        );
        assert_eq!(record.field("missing"), None);
    }
}
