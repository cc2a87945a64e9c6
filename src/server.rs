//! Axum HTTP server: stateless analysis endpoint.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/analyze` | Full board analysis |
//!
//! The engine is CPU-bound (propagation plus up to the sampling deadline),
//! so `/analyze` runs on the blocking pool. Configuration is server-side:
//! one [`AnalyzeConfig`] shared across requests, no per-request overrides.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::engine::{self, AnalyzeError};
use crate::types::{AnalysisResponse, AnalyzeConfig, AnalyzeRequest};

pub type AppState = Arc<AnalyzeConfig>;

pub fn create_router(config: AnalyzeConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/analyze", post(handle_analyze))
        .layer(cors)
        .with_state(Arc::new(config))
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn status_for(error: &AnalyzeError) -> StatusCode {
    if error.is_internal() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    }
}

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_analyze(
    State(config): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, (StatusCode, Json<serde_json::Value>)> {
    let outcome = tokio::task::spawn_blocking(move || engine::analyze(&request, &config)).await;

    match outcome {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(error)) => {
            tracing::debug!(%error, "analysis rejected");
            Err(error_response(status_for(&error), &error.to_string()))
        }
        Err(join_error) => {
            tracing::error!(%join_error, "analysis task panicked");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "analysis task failed",
            ))
        }
    }
}
