//! Bounded retry with exponential backoff around a [`TextBackend`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::backend::{ExtractedText, TextBackend, TransportError};

/// Retry budget for one model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_backoff: Self::DEFAULT_BASE_BACKOFF,
        }
    }
}

/// Every attempt of a model call failed.
#[derive(Debug, Error)]
#[error("model call failed after {attempts} attempt(s): {last}")]
pub struct ModelError {
    pub attempts: u32,
    #[source]
    pub last: TransportError,
}

/// Delay before the attempt following failed attempt `attempt` (1-indexed):
/// `base * 2^(attempt - 1)`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

/// A backend handle plus the model name and retry policy used for every call.
///
/// Built once at startup and shared by reference.
#[derive(Clone)]
pub struct ModelClient {
    backend: Arc<dyn TextBackend>,
    model: String,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(backend: Arc<dyn TextBackend>, model: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            model: model.into(),
            policy,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call the model with the client's own retry policy.
    pub async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.call(prompt, self.policy.max_attempts, self.policy.base_backoff)
            .await
    }

    /// Call the model up to `max_attempts` times.
    ///
    /// After failed attempt `n` the client sleeps
    /// [`backoff_delay(base_backoff, n)`](backoff_delay) before trying again;
    /// there is no sleep after the final attempt. When every attempt fails
    /// the last transport error is returned.
    pub async fn call(
        &self,
        prompt: &str,
        max_attempts: u32,
        base_backoff: Duration,
    ) -> Result<String, ModelError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!(
                backend = self.backend.name(),
                model = %self.model,
                attempt,
                prompt_chars = prompt.chars().count(),
                "calling model"
            );
            match self.backend.generate(&self.model, prompt).await {
                Ok(response) => {
                    return Ok(match response.extract_text() {
                        ExtractedText::Primary(text) | ExtractedText::Alternate(text) => text,
                        ExtractedText::Unavailable => {
                            warn!(
                                attempt,
                                "response has no text field; falling back to its string rendering (degraded data)"
                            );
                            response.render()
                        }
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(attempt, error = %e, "model call failed; no attempts left");
                    return Err(ModelError {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    let delay = backoff_delay(base_backoff, attempt);
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "model call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish()
    }
}
