//! Normalization helpers for scanned codes and provider metadata fields.

use chrono::NaiveDate;

/// The kind of code a scanner produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Isbn,
    Asin,
}

impl CodeKind {
    /// Wire value ("isbn" / "asin").
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Isbn => "isbn",
            CodeKind::Asin => "asin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCode {
    pub kind: CodeKind,
    pub value: String,
}

/// Accepts scanner input like "978-1-...", " ISBN:978...", etc.
///
/// Digits-only input of length 10 or 13 is an ISBN; otherwise a 10-char
/// alphanumeric code is treated as an ASIN (uppercased). Anything else is
/// unsupported.
pub fn normalize_code(raw: &str) -> Option<ScannedCode> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 || digits.len() == 13 {
        return Some(ScannedCode {
            kind: CodeKind::Isbn,
            value: digits,
        });
    }

    let alnum: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if alnum.len() == 10 {
        return Some(ScannedCode {
            kind: CodeKind::Asin,
            value: alnum.to_ascii_uppercase(),
        });
    }

    None
}

/// Normalize a provider publish date to `YYYY-MM-DD`.
///
/// Accepts `YYYY`, `YYYY-MM` and `YYYY-MM-DD`; missing month/day default
/// to 01. Returns None for anything that does not parse to a valid date.
pub fn format_publish_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut parts = raw.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 1,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Split comma-joined provider subject strings into unique genres.
///
/// Dedup is case-insensitive; output is capitalized and sorted.
pub fn extract_unique_genres(genres: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for genre in genres {
        for sub in genre.split(',') {
            let g = sub.trim().to_lowercase();
            if !g.is_empty() && seen.insert(g.clone()) {
                out.push(capitalize(&g));
            }
        }
    }
    out.sort();
    out
}

/// Lowercase alphanumeric slug with `-` separators, used in generated ids.
pub fn safe_slug(s: &str) -> String {
    let source = if s.is_empty() { "item" } else { s };
    let mut out = String::with_capacity(source.len());
    let mut last_dash = false;
    for ch in source.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_isbn13_with_separators() {
        let code = normalize_code(" 978-0-13-235088-4 ").unwrap();
        assert_eq!(code.kind, CodeKind::Isbn);
        assert_eq!(code.value, "9780132350884");
    }

    #[test]
    fn normalize_isbn10() {
        let code = normalize_code("0132350882").unwrap();
        assert_eq!(code.kind, CodeKind::Isbn);
        assert_eq!(code.value, "0132350882");
    }

    #[test]
    fn normalize_asin_uppercased() {
        let code = normalize_code("b00x4whp5e").unwrap();
        assert_eq!(code.kind, CodeKind::Asin);
        assert_eq!(code.value, "B00X4WHP5E");
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(normalize_code("").is_none());
        assert!(normalize_code("   ").is_none());
        assert!(normalize_code("12345").is_none());
        assert!(normalize_code("not-a-code-at-all").is_none());
    }

    #[test]
    fn publish_date_variants() {
        assert_eq!(format_publish_date("2008-08-01").as_deref(), Some("2008-08-01"));
        assert_eq!(format_publish_date("2008-08").as_deref(), Some("2008-08-01"));
        assert_eq!(format_publish_date("2008").as_deref(), Some("2008-01-01"));
        assert_eq!(format_publish_date("August 2008"), None);
        assert_eq!(format_publish_date("2008-13"), None);
        assert_eq!(format_publish_date(""), None);
    }

    #[test]
    fn genres_split_and_dedup() {
        let input = vec![
            "Fiction, science fiction".to_string(),
            "Science Fiction".to_string(),
            " drama ".to_string(),
        ];
        assert_eq!(
            extract_unique_genres(&input),
            vec!["Drama", "Fiction", "Science fiction"]
        );
    }

    #[test]
    fn slug_collapses_and_trims() {
        assert_eq!(safe_slug("Clean Code: A Handbook"), "clean-code-a-handbook");
        assert_eq!(safe_slug("  ---  "), "item");
        assert_eq!(safe_slug(""), "item");
    }
}
