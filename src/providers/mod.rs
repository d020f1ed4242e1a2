// Bibliographic metadata providers: OpenLibrary first, Google Books as
// fallback/enrichment.

pub mod models;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::codes::{extract_unique_genres, format_publish_date};
use crate::domain::models::{BookRecord, Identifiers, SourceRef};
use models::{OpenLibraryBook, OpenLibraryResponse, Volume, VolumesResponse};

const OPENLIBRARY_COVERS_BASE: &str = "https://covers.openlibrary.org/b/ISBN";
const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Clone, Debug)]
pub struct ProviderClient {
    client: reqwest::Client,
    openlibrary_url: String,
    google_books_url: String,
}

impl ProviderClient {
    pub fn new(
        openlibrary_url: impl Into<String>,
        google_books_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ProviderClient {
            client,
            openlibrary_url: openlibrary_url.into(),
            google_books_url: google_books_url.into(),
        })
    }

    /// GET the OpenLibrary Books API for one ISBN.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_openlibrary(&self, isbn: &str) -> anyhow::Result<Option<BookRecord>> {
        let key = format!("ISBN:{isbn}");
        let resp = self
            .client
            .get(&self.openlibrary_url)
            .query(&[
                ("bibkeys", key.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .send()
            .await?;
        let resp = resp.error_for_status()?;
        let body = resp.text().await?;
        let parsed: OpenLibraryResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                let snippet_len = body.len().min(2000);
                let snippet = &body[..snippet_len];
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse OpenLibrary response");
                return Err(e.into());
            }
        };

        Ok(parsed.get(&key).map(|b| map_openlibrary(isbn, &key, b)))
    }

    /// Query the Google Books volumes API by ISBN; first hit wins.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_google_books(&self, isbn: &str) -> anyhow::Result<Option<BookRecord>> {
        let resp = self
            .client
            .get(&self.google_books_url)
            .query(&[("q", format!("isbn:{isbn}"))])
            .send()
            .await?;
        let resp = resp.error_for_status()?;
        let body = resp.text().await?;
        let parsed: VolumesResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                let snippet_len = body.len().min(2000);
                let snippet = &body[..snippet_len];
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse Google Books response");
                return Err(e.into());
            }
        };

        Ok(parsed.items.first().map(|item| map_google(isbn, item)))
    }

    /// OpenLibrary first; on a hit, enrich with Google Books data (language,
    /// description, isbns, cover); on a miss, Google Books alone. Provider
    /// failures are logged and treated as a miss.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_with_fallback(&self, isbn: &str) -> Option<BookRecord> {
        match self.fetch_openlibrary(isbn).await {
            Ok(Some(ol)) => {
                return match self.fetch_google_books(isbn).await {
                    Ok(Some(gb)) => Some(merge_book_records(ol, gb)),
                    Ok(None) => Some(ol),
                    Err(e) => {
                        tracing::warn!(%isbn, error = %e, "Google Books enrichment failed");
                        Some(ol)
                    }
                };
            }
            Ok(None) => {
                tracing::debug!(%isbn, "no OpenLibrary result, trying Google Books");
            }
            Err(e) => {
                tracing::warn!(%isbn, error = %e, "OpenLibrary request failed");
            }
        }

        match self.fetch_google_books(isbn).await {
            Ok(Some(gb)) => Some(gb),
            Ok(None) => {
                tracing::info!(%isbn, "no provider found data");
                None
            }
            Err(e) => {
                tracing::warn!(%isbn, error = %e, "Google Books request failed");
                None
            }
        }
    }
}

fn map_openlibrary(isbn: &str, provider_key: &str, b: &OpenLibraryBook) -> BookRecord {
    // OpenLibrary can provide cover links; keep the canonical cover as fallback.
    let cover = b
        .best_cover()
        .map(String::from)
        .unwrap_or_else(|| format!("{OPENLIBRARY_COVERS_BASE}/{isbn}-L.jpg"));

    let mut links = BTreeMap::new();
    if let Some(url) = &b.url {
        links.insert("openlibrary".to_string(), Some(url.clone()));
    }

    let subjects: Vec<String> = b
        .subjects
        .iter()
        .filter_map(|s| s.name.clone())
        .collect();

    BookRecord {
        id: None,
        identifiers: Identifiers {
            isbn: Some(isbn.to_string()),
            isbn10: None,
            isbn13: (isbn.len() == 13).then(|| isbn.to_string()),
            asin: None,
        },
        title: b.title.clone(),
        subtitle: b.subtitle.clone(),
        authors: b.authors.iter().filter_map(|a| a.name.clone()).collect(),
        publish_date: b.publish_date.as_deref().and_then(format_publish_date),
        nb_pages: b.number_of_pages,
        publishers: b.publishers.iter().filter_map(|p| p.name.clone()).collect(),
        genres: extract_unique_genres(&subjects),
        // the "data" payload does not reliably include the language
        language: None,
        description: b.description().map(String::from),
        cover_image: Some(cover),
        links,
        sources: vec![SourceRef {
            provider: "openlibrary".to_string(),
            provider_key: Some(provider_key.to_string()),
        }],
        added_at: None,
        updated_at: None,
    }
}

fn map_google(isbn: &str, item: &Volume) -> BookRecord {
    let empty = models::VolumeInfo::default();
    let v = item.volume_info.as_ref().unwrap_or(&empty);

    let (isbn10, isbn13) = v.extract_isbns();
    // Prefer the canonical 13-digit form when present.
    let canon_isbn = isbn13
        .clone()
        .or_else(|| isbn10.clone())
        .unwrap_or_else(|| isbn.to_string());

    let description = v.description.as_deref().map(truncate_description);

    let mut links = BTreeMap::new();
    if let Some(url) = &v.info_link {
        links.insert("google".to_string(), Some(url.clone()));
    }
    if let Some(url) = &v.preview_link {
        links.insert("preview".to_string(), Some(url.clone()));
    }
    if let Some(url) = &v.canonical_volume_link {
        links.insert("canonical".to_string(), Some(url.clone()));
    }

    BookRecord {
        id: None,
        identifiers: Identifiers {
            isbn: Some(canon_isbn),
            isbn10,
            isbn13,
            asin: None,
        },
        title: v.title.clone(),
        subtitle: v.subtitle.clone(),
        authors: v.authors.clone(),
        publish_date: v.published_date.as_deref().and_then(format_publish_date),
        nb_pages: v.page_count,
        publishers: v.publisher.iter().cloned().collect(),
        genres: extract_unique_genres(&v.categories),
        language: v.language.clone(),
        description,
        cover_image: v.choose_cover().map(String::from),
        links,
        sources: vec![SourceRef {
            provider: "google_books".to_string(),
            provider_key: item.id.clone(),
        }],
        added_at: None,
        updated_at: None,
    }
}

/// Keep primary as authority, fill missing fields from secondary. List
/// fields are unioned with case-insensitive dedup; identifiers, links and
/// sources are merged.
pub fn merge_book_records(primary: BookRecord, secondary: BookRecord) -> BookRecord {
    fn pick(a: Option<String>, b: Option<String>) -> Option<String> {
        match a {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => b,
        }
    }

    fn union(a: Vec<String>, b: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        a.into_iter()
            .chain(b)
            .filter(|x| !x.trim().is_empty())
            .filter(|x| seen.insert(x.trim().to_lowercase()))
            .collect()
    }

    let identifiers = Identifiers {
        isbn: primary.identifiers.isbn.or(secondary.identifiers.isbn),
        isbn10: primary.identifiers.isbn10.or(secondary.identifiers.isbn10),
        isbn13: primary.identifiers.isbn13.or(secondary.identifiers.isbn13),
        asin: primary.identifiers.asin.or(secondary.identifiers.asin),
    };

    // secondary first so primary entries win
    let mut links = secondary.links;
    links.extend(primary.links);

    let mut sources = primary.sources;
    let mut seen: std::collections::HashSet<(String, Option<String>)> = sources
        .iter()
        .map(|s| (s.provider.clone(), s.provider_key.clone()))
        .collect();
    for s in secondary.sources {
        if seen.insert((s.provider.clone(), s.provider_key.clone())) {
            sources.push(s);
        }
    }

    BookRecord {
        id: primary.id,
        identifiers,
        title: pick(primary.title, secondary.title),
        subtitle: pick(primary.subtitle, secondary.subtitle),
        authors: union(primary.authors, secondary.authors),
        publish_date: pick(primary.publish_date, secondary.publish_date),
        nb_pages: primary.nb_pages.or(secondary.nb_pages),
        publishers: union(primary.publishers, secondary.publishers),
        genres: union(primary.genres, secondary.genres),
        language: pick(primary.language, secondary.language),
        description: pick(primary.description, secondary.description),
        cover_image: pick(primary.cover_image, secondary.cover_image),
        links,
        sources,
        added_at: primary.added_at,
        updated_at: primary.updated_at,
    }
}

fn truncate_description(desc: &str) -> String {
    if desc.chars().count() <= MAX_DESCRIPTION_CHARS {
        return desc.to_string();
    }
    let mut out: String = desc.chars().take(MAX_DESCRIPTION_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openlibrary_record() -> BookRecord {
        let json = r#"
        {
            "title": "Clean Code",
            "authors": [{ "name": "Robert C. Martin" }],
            "publish_date": "2008",
            "number_of_pages": 431,
            "publishers": [{ "name": "Prentice Hall" }],
            "subjects": [{ "name": "Computer software, Agile" }],
            "url": "https://openlibrary.org/books/OL26222911M"
        }
        "#;
        let b: OpenLibraryBook = serde_json::from_str(json).unwrap();
        map_openlibrary("9780132350884", "ISBN:9780132350884", &b)
    }

    fn google_record() -> BookRecord {
        let json = r#"
        {
            "id": "vol1",
            "volumeInfo": {
                "title": "Clean Code",
                "subtitle": "A Handbook of Agile Software Craftsmanship",
                "authors": ["Robert C. Martin", "Extra Author"],
                "publishedDate": "2008-08-01",
                "language": "en",
                "description": "A revolutionary paradigm...",
                "industryIdentifiers": [
                    { "type": "ISBN_13", "identifier": "9780132350884" },
                    { "type": "ISBN_10", "identifier": "0132350882" }
                ],
                "imageLinks": { "thumbnail": "http://books.google.com/thumb.jpg" },
                "previewLink": "http://books.google.com/books?id=vol1&printsec=frontcover"
            }
        }
        "#;
        let v: Volume = serde_json::from_str(json).unwrap();
        map_google("9780132350884", &v)
    }

    #[test]
    fn openlibrary_mapping_fills_canonical_cover() {
        let r = openlibrary_record();
        assert_eq!(r.title.as_deref(), Some("Clean Code"));
        assert_eq!(r.publish_date.as_deref(), Some("2008-01-01"));
        assert_eq!(
            r.cover_image.as_deref(),
            Some("https://covers.openlibrary.org/b/ISBN/9780132350884-L.jpg")
        );
        assert_eq!(r.genres, vec!["Agile", "Computer software"]);
        assert_eq!(r.identifiers.isbn13.as_deref(), Some("9780132350884"));
        assert_eq!(r.sources[0].provider, "openlibrary");
    }

    #[test]
    fn google_mapping_prefers_isbn13() {
        let r = google_record();
        assert_eq!(r.identifiers.isbn.as_deref(), Some("9780132350884"));
        assert_eq!(r.identifiers.isbn10.as_deref(), Some("0132350882"));
        assert_eq!(r.language.as_deref(), Some("en"));
        assert_eq!(r.sources[0].provider_key.as_deref(), Some("vol1"));
    }

    #[test]
    fn merge_backfills_without_overriding() {
        let merged = merge_book_records(openlibrary_record(), google_record());
        // primary scalars win, secondary backfills the gaps
        assert_eq!(merged.title.as_deref(), Some("Clean Code"));
        assert_eq!(merged.language.as_deref(), Some("en"));
        assert_eq!(
            merged.subtitle.as_deref(),
            Some("A Handbook of Agile Software Craftsmanship")
        );
        assert_eq!(merged.nb_pages, Some(431));
        // authors unioned, dedup case-insensitive
        assert_eq!(merged.authors, vec!["Robert C. Martin", "Extra Author"]);
        // both sources kept
        let providers = merged
            .sources
            .iter()
            .map(|s| s.provider.as_str())
            .collect::<Vec<_>>();
        assert_eq!(providers, vec!["openlibrary", "google_books"]);
        assert!(merged.links.contains_key("openlibrary"));
        assert!(merged.links.contains_key("preview"));
    }

    #[test]
    fn merge_dedups_sources_by_provider_and_key() {
        let a = openlibrary_record();
        let b = openlibrary_record();
        let merged = merge_book_records(a, b);
        assert_eq!(merged.sources.len(), 1);
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "x".repeat(5000);
        let out = truncate_description(&long);
        assert_eq!(out.chars().count(), MAX_DESCRIPTION_CHARS + 3);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_description("short"), "short");
    }
}
