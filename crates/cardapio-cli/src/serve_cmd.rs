//! `cardapio serve`: the ingredient flow over HTTP for a browser front-end.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use cardapio_core::{AssembleError, PlanAssembler};

use crate::plan_cmds::parse_ingredients;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<AssembleError> for AppError {
    fn from(err: AssembleError) -> Self {
        let status = match &err {
            AssembleError::EmptyIngredients => StatusCode::BAD_REQUEST,
            AssembleError::Transport(_) => StatusCode::BAD_GATEWAY,
            AssembleError::Decode { .. } | AssembleError::Schema { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AssembleError::Emit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Ingredients as one comma-separated string or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngredientInput {
    Text(String),
    List(Vec<String>),
}

impl Default for IngredientInput {
    fn default() -> Self {
        IngredientInput::List(Vec::new())
    }
}

impl IngredientInput {
    pub fn into_items(self) -> Vec<String> {
        match self {
            IngredientInput::Text(text) => parse_ingredients(&text),
            IngredientInput::List(items) => parse_ingredients(&items.join(",")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default, alias = "ingredients")]
    pub ingredientes: IngredientInput,
    #[serde(default, alias = "allow_extras")]
    pub permitir_extras: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// One assembler shared by all requests; the lock keeps runs sequential.
type SharedAssembler = Arc<Mutex<PlanAssembler>>;

pub fn build_router(assembler: PlanAssembler) -> Router {
    Router::new()
        .route("/gerar-cardapio", post(generate_plan))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(Mutex::new(assembler)))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(assembler: PlanAssembler, bind: &str, port: u16) -> Result<()> {
    let app = build_router(assembler);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("cardapio serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("cardapio serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_plan(
    State(assembler): State<SharedAssembler>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let ingredients = request.ingredientes.into_items();
    tracing::info!(
        ingredients = ingredients.len(),
        allow_extras = request.permitir_extras,
        "plan requested"
    );

    let assembler = assembler.lock().await;
    let report = assembler
        .run_ingredient_plan(&ingredients, request.permitir_extras)
        .await?;
    Ok(Json(report.plan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use cardapio_core::llm::TextBackend;
    use cardapio_core::{DayLocale, OutputDir, PlanAssembler};
    use cardapio_test_utils::{FailingBackend, ScriptedBackend, seven_day_plan_json, test_client};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn assembler(backend: Arc<dyn TextBackend>, dir: &Path) -> PlanAssembler {
        PlanAssembler::new(
            test_client(backend),
            OutputDir::new(dir, DayLocale::Portuguese),
        )
    }

    async fn post_json(
        assembler: PlanAssembler,
        body: &str,
    ) -> axum::response::Response {
        let app = super::build_router(assembler);
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/gerar-cardapio")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_plan_returns_plan() {
        let tmp = TempDir::new().unwrap();
        let plan = seven_day_plan_json(DayLocale::Portuguese);
        let backend = Arc::new(ScriptedBackend::with_replies([plan.to_string()]));

        let resp = post_json(
            assembler(backend.clone(), tmp.path()),
            r#"{"ingredientes": "arroz, ovo", "permitir_extras": true}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let days: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(days, plan.as_object().unwrap().keys().collect::<Vec<_>>());
        assert_eq!(body["Segunda"][0]["nome"], "Segunda lunch");
        assert_eq!(body["Segunda"][0]["ingredientes"], json!(["rice", "egg"]));
        assert_eq!(body["Segunda"][1]["modo_preparo"], "Prepare Segunda dinner.");
        assert!(body["Segunda"][0].get("name").is_none());

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Available ingredients: arroz, ovo."));
        assert!(prompt.contains("salt, oil, garlic, onion"));
        assert!(tmp.path().join("segunda.txt").exists());
    }

    #[tokio::test]
    async fn test_english_aliases_and_list_input() {
        let tmp = TempDir::new().unwrap();
        let backend = Arc::new(ScriptedBackend::with_replies([
            seven_day_plan_json(DayLocale::Portuguese).to_string(),
        ]));

        let resp = post_json(
            assembler(backend.clone(), tmp.path()),
            r#"{"ingredients": ["rice", " egg "], "allow_extras": false}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Available ingredients: rice, egg."));
        assert!(prompt.contains("Use only the listed ingredients"));
    }

    #[tokio::test]
    async fn test_empty_ingredients_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let backend = Arc::new(ScriptedBackend::new());

        let resp = post_json(
            assembler(backend.clone(), tmp.path()),
            r#"{"ingredientes": " , "}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json, json!({"error": "no ingredients supplied"}));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let resp = post_json(
            assembler(Arc::new(ScriptedBackend::new()), tmp.path()),
            "{not json",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_unprocessable() {
        let tmp = TempDir::new().unwrap();
        let backend = Arc::new(ScriptedBackend::repeating("I cannot do that."));

        let resp = post_json(
            assembler(backend, tmp.path()),
            r#"{"ingredientes": "arroz"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        let msg = json["error"].as_str().unwrap();
        assert!(msg.contains("not valid JSON"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn test_transport_failure_is_bad_gateway() {
        let tmp = TempDir::new().unwrap();
        let backend = Arc::new(FailingBackend::new());

        let resp = post_json(
            assembler(backend.clone(), tmp.path()),
            r#"{"ingredientes": "arroz"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_get_is_not_allowed() {
        let tmp = TempDir::new().unwrap();
        let app = super::build_router(assembler(Arc::new(ScriptedBackend::new()), tmp.path()));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/gerar-cardapio")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
