use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_connection_string: String,
    pub openlibrary_url: String,
    pub google_books_url: String,
    pub provider_timeout_secs: u64,
    pub api_base_url: String,
    pub prefs_path: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn load() -> Self {
        let port = env::var("SHELFSCAN_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);
        let provider_timeout_secs = env::var("SHELFSCAN_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Config {
            port,
            db_connection_string: env_or(
                "SHELFSCAN_DATABASE_URL",
                "sqlite://shelfscan.sqlite?mode=rwc",
            ),
            openlibrary_url: env_or("SHELFSCAN_OPENLIBRARY_URL", "https://openlibrary.org/api/books"),
            google_books_url: env_or(
                "SHELFSCAN_GOOGLE_BOOKS_URL",
                "https://www.googleapis.com/books/v1/volumes",
            ),
            provider_timeout_secs,
            api_base_url: env_or(
                "SHELFSCAN_API_BASE_URL",
                &format!("http://localhost:{port}"),
            ),
            prefs_path: env_or("SHELFSCAN_PREFS_PATH", "shelfscan_prefs.json"),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.db_connection_string.is_empty() {
            return Err("SHELFSCAN_DATABASE_URL must not be empty".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("SHELFSCAN_PROVIDER_TIMEOUT_SECS must be at least 1".to_string());
        }
        if !self.api_base_url.starts_with("http") {
            return Err("SHELFSCAN_API_BASE_URL must be an http(s) URL".to_string());
        }
        Ok(())
    }
}
