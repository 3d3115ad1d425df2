//! Google Gemini backend over the `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use super::backend::{BackendResponse, OutputField, TextBackend, TransportError};

/// Connection settings for [`GeminiBackend`].
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base endpoint URL, without the `/models/...` suffix.
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Gemini text backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[async_trait]
impl TextBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<BackendResponse, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|_| TransportError::Http("API key contains invalid header characters".into()))?;
        headers.insert("x-goog-api-key", key);

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.build_url(model))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;
        response_from_json(raw)
    }
}

/// Interpret a decoded `generateContent` reply.
///
/// The primary text is the concatenation of every text part of the first
/// candidate; a top-level `output` field, if present, is the alternate.
pub fn response_from_json(raw: Value) -> Result<BackendResponse, TransportError> {
    if let Some(error) = raw.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(TransportError::Api(message));
    }

    let text = raw
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .filter(|t| !t.is_empty());

    let output = match raw.get("output") {
        Some(Value::String(s)) => Some(OutputField::Text(s.clone())),
        Some(Value::Array(items)) => Some(OutputField::Sequence(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        _ => None,
    };

    Ok(BackendResponse { text, output, raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::backend::ExtractedText;
    use serde_json::json;

    #[test]
    fn default_config() {
        let config = GeminiConfig::new("k");
        assert!(config.endpoint.contains("generativelanguage.googleapis.com"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GeminiConfig::new("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn build_url_targets_model() {
        let mut config = GeminiConfig::new("test-key");
        config.endpoint = "http://localhost:9999/v1beta/".to_string();
        let backend = GeminiBackend::new(config).unwrap();
        let url = backend.build_url("gemini-2.5-flash");
        assert_eq!(
            url,
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!url.contains("test-key"));
    }

    #[test]
    fn joins_candidate_parts() {
        let raw = json!({
            "candidates": [{"content": {"parts": [{"text": "```json\n"}, {"text": "{}\n```"}]}}]
        });
        let resp = response_from_json(raw).unwrap();
        assert_eq!(
            resp.extract_text(),
            ExtractedText::Primary("```json\n{}\n```".to_string())
        );
    }

    #[test]
    fn api_error_is_a_transport_error() {
        let raw = json!({"error": {"code": 429, "message": "quota exceeded"}});
        let err = response_from_json(raw).unwrap_err();
        assert!(matches!(err, TransportError::Api(ref m) if m == "quota exceeded"));
    }

    #[test]
    fn output_field_is_the_alternate() {
        let raw = json!({"candidates": [], "output": ["first", {"n": 2}]});
        let resp = response_from_json(raw).unwrap();
        assert!(resp.text.is_none());
        assert_eq!(
            resp.output,
            Some(OutputField::Sequence(vec!["first".to_string(), r#"{"n":2}"#.to_string()]))
        );
    }

    #[test]
    fn blocked_reply_has_no_text() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let resp = response_from_json(raw).unwrap();
        assert_eq!(resp.extract_text(), ExtractedText::Unavailable);
    }
}
