// Domain model for a cataloged book, shared by the provider client, the
// store and the API layer. Matches the JSON wire shape end to end.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub isbn10: Option<String>,
    #[serde(default)]
    pub isbn13: Option<String>,
    #[serde(default)]
    pub asin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub provider: String,
    #[serde(default)]
    pub provider_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub nb_pages: Option<i32>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub links: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BookRecord {
    /// Prefer isbn13, then isbn10, then the plain isbn.
    pub fn best_isbn(&self) -> Option<&str> {
        [
            self.identifiers.isbn13.as_deref(),
            self.identifiers.isbn10.as_deref(),
            self.identifiers.isbn.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
    }

    /// Unique provider names, in first-seen order.
    pub fn providers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.sources
            .iter()
            .filter(|s| !s.provider.is_empty())
            .filter(|s| seen.insert(s.provider.clone()))
            .map(|s| s.provider.clone())
            .collect()
    }

    /// A book needs a refresh when any of the core display fields is missing.
    pub fn needs_refresh(&self) -> bool {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map(str::trim).unwrap_or("").is_empty()
        }
        blank(&self.title)
            || self.authors.is_empty()
            || blank(&self.publish_date)
            || blank(&self.cover_image)
            || blank(&self.language)
    }

    pub fn from_model(m: entities::book::Model) -> Self {
        BookRecord {
            id: Some(m.id),
            identifiers: Identifiers {
                isbn: m.isbn,
                isbn10: m.isbn10,
                isbn13: m.isbn13,
                asin: m.asin,
            },
            title: m.title,
            subtitle: m.subtitle,
            authors: serde_json::from_value(m.authors).unwrap_or_default(),
            publish_date: m.publish_date,
            nb_pages: m.nb_pages,
            publishers: serde_json::from_value(m.publishers).unwrap_or_default(),
            genres: serde_json::from_value(m.genres).unwrap_or_default(),
            language: m.language,
            description: m.description,
            cover_image: m.cover_image,
            links: serde_json::from_value(m.links).unwrap_or_default(),
            sources: serde_json::from_value(m.sources).unwrap_or_default(),
            added_at: Some(m.added_at),
            updated_at: Some(m.updated_at),
        }
    }
}
