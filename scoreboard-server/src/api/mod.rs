//! HTTP API handlers for scoreboard-server

pub mod error;
pub mod health;
pub mod scores;

pub use error::{ApiError, ErrorResponse};
pub use health::health_routes;
pub use scores::{check_name, clear_scores, get_leaderboard, submit_score};
