//! The `TextBackend` trait -- the adapter interface for text-generation
//! services -- and the response shape it returns.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A failure of a single backend call. Always worth retrying with the same
/// prompt; see [`super::ModelClient`].
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend error: {0}")]
    Api(String),

    #[error("undecodable backend response: {0}")]
    Decode(String),
}

/// The alternate output field some backends use instead of a text field.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputField {
    Text(String),
    Sequence(Vec<String>),
}

/// One complete backend response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResponse {
    /// Primary text payload.
    pub text: Option<String>,
    /// Alternate output field, consulted when `text` is absent or empty.
    pub output: Option<OutputField>,
    /// The whole response as received, for the last-resort rendering.
    pub raw: Value,
}

/// Where the text of a response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Primary(String),
    Alternate(String),
    /// Neither field carries text.
    Unavailable,
}

impl BackendResponse {
    /// A response carrying only a primary text payload.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: Value::String(text.clone()),
            text: Some(text),
            output: None,
        }
    }

    /// Pick the text payload by priority: non-empty `text`, then a non-empty
    /// `output` string, then the first element of a non-empty `output`
    /// sequence.
    pub fn extract_text(&self) -> ExtractedText {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return ExtractedText::Primary(text.to_string());
        }
        match &self.output {
            Some(OutputField::Text(text)) if !text.is_empty() => {
                ExtractedText::Alternate(text.clone())
            }
            Some(OutputField::Sequence(items)) => match items.first() {
                Some(first) => ExtractedText::Alternate(first.clone()),
                None => ExtractedText::Unavailable,
            },
            _ => ExtractedText::Unavailable,
        }
    }

    /// String rendering of the whole response. A response with no payload
    /// at all renders as the empty string.
    pub fn render(&self) -> String {
        match &self.raw {
            Value::Null => String::new(),
            raw => raw.to_string(),
        }
    }
}

/// Adapter interface for a remote text-generation model.
///
/// One call is one complete response or one [`TransportError`]; no
/// streaming. Implementations must be object-safe so they can be shared as
/// `Arc<dyn TextBackend>`.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt` to `model` and wait for the full response.
    async fn generate(&self, model: &str, prompt: &str) -> Result<BackendResponse, TransportError>;
}

// Compile-time assertion: TextBackend must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextBackend) {}
};
