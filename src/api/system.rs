//! System endpoints: health check and stream catalog listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Streams available for subscription.
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamsResponse {
    /// Registered stream names, sorted.
    pub streams: Vec<String>,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /streams` — List subscribable stream names.
#[utoipa::path(
    get,
    path = "/streams",
    tag = "System",
    summary = "List streams",
    description = "Returns every stream name a WebSocket client may pass to `subscribe`.",
    responses(
        (status = 200, description = "Stream catalog", body = StreamsResponse),
    )
)]
pub async fn streams_handler(State(state): State<AppState>) -> impl IntoResponse {
    let streams = state
        .catalog
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();
    (StatusCode::OK, Json(StreamsResponse { streams }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/streams", get(streams_handler))
}
