//! JSON POST request client with uniform error semantics. Every server
//! call the scan workflow makes goes through this.

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST `payload` as JSON and return the parsed response body.
    ///
    /// An empty body parses to null; a non-JSON body becomes a synthetic
    /// `{"error": <raw text>}` object. Non-2xx statuses produce an error
    /// whose message is the body's `error` field when present, else
    /// `HTTP <status>`.
    async fn post_json(&self, path: &str, payload: Option<Value>) -> anyhow::Result<Value>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url: String = base_url.into();
        Ok(HttpTransport {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    #[tracing::instrument(level = "debug", skip(self, payload))]
    async fn post_json(&self, path: &str, payload: Option<Value>) -> anyhow::Result<Value> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&payload.unwrap_or(Value::Null))
            .send()
            .await?;

        let ok = resp.status().is_success();
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        interpret_response(ok, status, &body)
    }
}

pub(crate) fn interpret_response(ok: bool, status: u16, body: &str) -> anyhow::Result<Value> {
    let parsed = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap_or_else(|_| serde_json::json!({ "error": body }))
    };

    if !ok {
        let message = parsed
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {status}"));
        anyhow::bail!(message);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_null() {
        assert_eq!(interpret_response(true, 200, "").unwrap(), Value::Null);
        assert_eq!(interpret_response(true, 200, "  \n").unwrap(), Value::Null);
    }

    #[test]
    fn valid_json_passes_through() {
        let out = interpret_response(true, 200, r#"{"kind":"isbn","value":"1"}"#).unwrap();
        assert_eq!(out, json!({"kind": "isbn", "value": "1"}));
    }

    #[test]
    fn non_json_body_becomes_synthetic_error_object() {
        let out = interpret_response(true, 200, "<html>oops</html>").unwrap();
        assert_eq!(out, json!({"error": "<html>oops</html>"}));
    }

    #[test]
    fn failure_uses_server_error_field() {
        let err = interpret_response(false, 400, r#"{"error":"Unsupported code."}"#).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported code.");
    }

    #[test]
    fn failure_without_error_field_is_generic() {
        let err = interpret_response(false, 502, r#"{"detail":"?"}"#).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502");

        let err = interpret_response(false, 500, "").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn failure_with_non_json_body_keeps_raw_text() {
        let err = interpret_response(false, 503, "service melting").unwrap_err();
        assert_eq!(err.to_string(), "service melting");
    }

    #[test]
    fn url_joining() {
        let t = HttpTransport::new("http://localhost:5000/").unwrap();
        assert_eq!(t.url("/api/books"), "http://localhost:5000/api/books");
        assert_eq!(t.url("api/books"), "http://localhost:5000/api/books");
    }
}
