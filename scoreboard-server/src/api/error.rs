//! HTTP error responses
//!
//! Maps the common error taxonomy onto status codes. Store failures are
//! reported with a generic message; details stay in the server log.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scoreboard_common::Error;
use serde::Serialize;

/// Error body returned by every API route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,
    /// Human-readable reason
    pub message: String,
}

/// Error type returned by handlers
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self.0 {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            Error::NameTaken(name) => (
                StatusCode::CONFLICT,
                "name_taken",
                format!(
                    "The name '{}' is already taken. Please choose another one.",
                    name
                ),
            ),
            Error::Conflict { key, .. } => (
                StatusCode::CONFLICT,
                "conflict",
                format!("A score with this {} already exists", key),
            ),
            Error::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Scoreboard is temporarily unavailable, please retry".to_string(),
            ),
            Error::NotFound(_)
            | Error::Database(_)
            | Error::Config(_)
            | Error::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Failed to process request".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: kind.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(Error::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(Error::NameTaken("Ace".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(Error::StoreUnavailable("busy".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(Error::NotFound("ghost".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
