//! Shared test utilities for cardapio integration tests.
//!
//! Provides scripted [`TextBackend`]s that never touch the network, and JSON
//! fixtures shaped like real model replies.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use cardapio_core::DayLocale;
use cardapio_core::llm::{BackendResponse, ModelClient, RetryPolicy, TextBackend, TransportError};

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Replays queued outcomes in order and records every prompt it receives.
///
/// Once the queue is empty it keeps returning the `repeat` reply if one was
/// set, otherwise a transport error.
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<BackendResponse, TransportError>>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend answering each call with the next reply text.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for reply in replies {
            backend.push_text(reply);
        }
        backend
    }

    /// A backend answering every call with the same text.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            repeat: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn push_text(&self, reply: impl Into<String>) {
        self.push(Ok(BackendResponse::from_text(reply)));
    }

    pub fn push_failure(&self, error: TransportError) {
        self.push(Err(error));
    }

    pub fn push(&self, outcome: Result<BackendResponse, TransportError>) {
        self.outcomes
            .lock()
            .expect("outcomes lock poisoned")
            .push_back(outcome);
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock poisoned").len()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _model: &str, prompt: &str) -> Result<BackendResponse, TransportError> {
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());
        let next = self
            .outcomes
            .lock()
            .expect("outcomes lock poisoned")
            .pop_front();
        match (next, &self.repeat) {
            (Some(outcome), _) => outcome,
            (None, Some(reply)) => Ok(BackendResponse::from_text(reply.clone())),
            (None, None) => Err(TransportError::Http("script exhausted".to_string())),
        }
    }
}

/// A backend whose every call fails with a connection error.
#[derive(Default)]
pub struct FailingBackend {
    calls: AtomicU32,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _model: &str, _prompt: &str) -> Result<BackendResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Http("connection refused".to_string()))
    }
}

/// Retry policy with negligible backoff, for tests on a real clock.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
    }
}

/// Model client over `backend` with [`fast_policy`].
pub fn test_client(backend: Arc<dyn TextBackend>) -> ModelClient {
    ModelClient::new(backend, "test-model", fast_policy())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn recipe_json(name: &str, ingredients: &[&str]) -> Value {
    json!({
        "name": name,
        "ingredients": ingredients,
        "preparation": format!("Prepare {name}.")
    })
}

/// A complete week in `locale`: each day's lunch uses rice and egg, dinner
/// uses egg and milk.
pub fn seven_day_plan_json(locale: DayLocale) -> Value {
    let mut plan = Map::new();
    for day in locale.day_names() {
        plan.insert(
            day.to_string(),
            json!([
                recipe_json(&format!("{day} lunch"), &["rice", "egg"]),
                recipe_json(&format!("{day} dinner"), &["egg", "milk"]),
            ]),
        );
    }
    Value::Object(plan)
}

/// `count` recipes named `Recipe 1..=count`, each with one shared and one
/// unique ingredient.
pub fn recipe_batch_json(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|i| recipe_json(&format!("Recipe {i}"), &["onion", &format!("item {i}")]))
            .collect(),
    )
}

/// A selection assigning `names` round-robin to lunch and dinner of every
/// day in `locale`.
pub fn selection_json(locale: DayLocale, names: &[&str]) -> Value {
    let mut plan = Map::new();
    let mut cycle = names.iter().cycle();
    for day in locale.day_names() {
        let lunch = cycle.next().copied().unwrap_or_default();
        let dinner = cycle.next().copied().unwrap_or_default();
        plan.insert(day.to_string(), json!([lunch, dinner]));
    }
    Value::Object(plan)
}

/// Wrap `value` in a tagged code fence, the way models often reply.
pub fn fenced(value: &Value) -> String {
    format!("```json\n{value:#}\n```")
}
