//! Serde models for the OpenLibrary Books API and the Google Books
//! volumes API. Only the fields we map are typed; both providers send a
//! lot more.

use std::collections::HashMap;

use serde::Deserialize;

// ============ OpenLibrary ============

/// `GET /api/books?bibkeys=ISBN:<n>&format=json&jscmd=data` returns a map
/// keyed by the requested bibkey.
pub type OpenLibraryResponse = HashMap<String, OpenLibraryBook>;

#[derive(Debug, Deserialize, PartialEq)]
pub struct OpenLibraryBook {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<NamedRef>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i32>,
    #[serde(default)]
    pub publishers: Vec<NamedRef>,
    #[serde(default)]
    pub subjects: Vec<NamedRef>,
    /// Sometimes a plain string, sometimes a structured object.
    pub notes: Option<serde_json::Value>,
    pub cover: Option<CoverLinks>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct NamedRef {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CoverLinks {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl OpenLibraryBook {
    /// Largest available cover, if any.
    pub fn best_cover(&self) -> Option<&str> {
        let c = self.cover.as_ref()?;
        c.large
            .as_deref()
            .or(c.medium.as_deref())
            .or(c.small.as_deref())
    }

    /// Notes are only usable as a description when they are a plain string.
    pub fn description(&self) -> Option<&str> {
        self.notes.as_ref().and_then(|n| n.as_str())
    }
}

// ============ Google Books ============

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: Option<String>,
    pub volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub published_date: Option<String>,
    pub page_count: Option<i32>,
    pub publisher: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    pub info_link: Option<String>,
    pub preview_link: Option<String>,
    pub canonical_volume_link: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
    pub extra_large: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub identifier: Option<String>,
}

impl VolumeInfo {
    /// Largest cover first, down to the small thumbnail.
    pub fn choose_cover(&self) -> Option<&str> {
        let links = self.image_links.as_ref()?;
        links
            .large
            .as_deref()
            .or(links.medium.as_deref())
            .or(links.small.as_deref())
            .or(links.thumbnail.as_deref())
            .or(links.small_thumbnail.as_deref())
    }

    /// (isbn10, isbn13) from the industry identifiers.
    pub fn extract_isbns(&self) -> (Option<String>, Option<String>) {
        let mut isbn10 = None;
        let mut isbn13 = None;
        for id in &self.industry_identifiers {
            let ident = id.identifier.as_deref().map(str::trim).unwrap_or("");
            if ident.is_empty() {
                continue;
            }
            match id.kind.as_deref().map(str::to_ascii_uppercase).as_deref() {
                Some("ISBN_13") => isbn13 = Some(ident.to_string()),
                Some("ISBN_10") => isbn10 = Some(ident.to_string()),
                _ => {}
            }
        }
        (isbn10, isbn13)
    }
}
