//! scoreboard-server library
//!
//! Accepts score submissions from game clients, keeps one best score per
//! device, and serves the ranked leaderboard over HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub mod api;
pub mod service;
pub mod store;

pub use service::{SubmissionService, SubmitOutcome};
pub use store::{ScoreStore, SqliteScoreStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SubmissionService,
}

impl AppState {
    /// Create new application state
    pub fn new(service: SubmissionService) -> Self {
        Self { service }
    }

    /// Compose the service over a store
    pub fn with_store(store: Arc<dyn ScoreStore>, leaderboard_max_limit: u32) -> Self {
        Self::new(SubmissionService::new(store, leaderboard_max_limit))
    }
}

/// Build application router
///
/// Requests running longer than `request_timeout` are answered with 408.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    use axum::routing::{get, post};

    let scores = Router::new()
        .route(
            "/api/scores",
            get(api::get_leaderboard)
                .post(api::submit_score)
                .delete(api::clear_scores),
        )
        .route("/api/check-name", post(api::check_name))
        .route("/leaderboard", get(api::get_leaderboard));

    Router::new()
        .merge(scores)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
