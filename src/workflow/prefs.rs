//! Small key-value preference store with per-entry expiry, the
//! platform-neutral stand-in for the browser's preference cookies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCANNER_MODE_KEY: &str = "scanner_mode";
pub const SCANNER_DELAY_KEY: &str = "scanner_delay";

/// ~180 days, matching the cookie expiry of the browser client.
pub const PREF_MAX_AGE: Duration = Duration::from_secs(180 * 24 * 60 * 60);

pub trait PrefStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str, max_age: Duration);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrefEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// JSON-file-backed preference store; expired entries are dropped on load.
pub struct FilePrefStore {
    path: PathBuf,
    entries: BTreeMap<String, PrefEntry>,
}

impl FilePrefStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries: BTreeMap<String, PrefEntry> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();

        let now = Utc::now();
        entries.retain(|_, e| e.expires_at > now);
        FilePrefStore { path, entries }
    }

    fn persist(&self) {
        let body = match serde_json::to_string_pretty(&self.entries) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize preferences");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, body) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write preferences");
        }
    }
}

impl PrefStore for FilePrefStore {
    fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        (entry.expires_at > Utc::now()).then(|| entry.value.clone())
    }

    fn set(&mut self, key: &str, value: &str, max_age: Duration) {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::days(180));
        self.entries.insert(
            key.to_string(),
            PrefEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        self.persist();
    }
}

/// In-memory store, for tests and one-off sessions. Ignores expiry.
#[derive(Debug, Default)]
pub struct MemoryPrefStore {
    entries: BTreeMap<String, String>,
}

impl MemoryPrefStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        MemoryPrefStore {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl PrefStore for MemoryPrefStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str, _max_age: Duration) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = FilePrefStore::open(&path);
        assert_eq!(store.get(SCANNER_MODE_KEY), None);
        store.set(SCANNER_MODE_KEY, "1", PREF_MAX_AGE);
        store.set(SCANNER_DELAY_KEY, "400", PREF_MAX_AGE);

        let reloaded = FilePrefStore::open(&path);
        assert_eq!(reloaded.get(SCANNER_MODE_KEY).as_deref(), Some("1"));
        assert_eq!(reloaded.get(SCANNER_DELAY_KEY).as_deref(), Some("400"));
    }

    #[test]
    fn expired_entries_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = FilePrefStore::open(&path);
        store.set("stale", "x", Duration::from_secs(0));
        store.set("fresh", "y", PREF_MAX_AGE);

        let reloaded = FilePrefStore::open(&path);
        assert_eq!(reloaded.get("stale"), None);
        assert_eq!(reloaded.get("fresh").as_deref(), Some("y"));
    }

    #[test]
    fn unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FilePrefStore::open(&path);
        assert_eq!(store.get("anything"), None);
    }
}
