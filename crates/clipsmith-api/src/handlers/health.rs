//! Health and readiness handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe; fails while the queue backend is unreachable.
pub async fn ready(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    match state.queue.len().await {
        Ok(_) => Ok(Json(HealthResponse { status: "ready" })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
