//! Text-generation backends and the retrying model client.
//!
//! # Architecture
//!
//! ```text
//! PlanAssembler
//!     |
//!     v
//! ModelClient { backend, model, policy }
//!     |  call(prompt, max_attempts, base_backoff)
//!     |      retry loop, sleeping base * 2^(n-1) after failure n
//!     v
//! Arc<dyn TextBackend> --generate(model, prompt)--> BackendResponse
//!                                                      |
//!                                 extract_text(): text > output > render()
//! ```

pub mod backend;
pub mod gemini;
pub mod retry;

pub use backend::{BackendResponse, ExtractedText, OutputField, TextBackend, TransportError};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use retry::{ModelClient, ModelError, RetryPolicy, backoff_delay};
