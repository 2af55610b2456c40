//! Health check endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Stored record count; absent when the store cannot be reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<i64>,
}

/// GET /
///
/// Plain-text liveness probe.
pub async fn root() -> &'static str {
    "Scoreboard API is running!"
}

/// GET /health
///
/// Reports 503 when the score store cannot be queried.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, records) = match state.service.record_count().await {
        Ok(count) => (StatusCode::OK, "ok", Some(count)),
        Err(e) => {
            warn!("Health check could not reach score store: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", None)
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            module: "scoreboard-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            records,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
