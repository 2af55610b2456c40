//! Score submission, leaderboard, name check and clear endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use scoreboard_common::{Error, RankedScore, ScoreRecord, SubmitStatus, Submission};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use crate::AppState;

/// Score as sent by clients: a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScoreValue {
    /// Whole-number score; fractions and non-numeric text are rejected
    pub fn to_score(&self) -> Result<i64, Error> {
        let invalid = || Error::Validation("score must be a positive whole number".to_string());
        match self {
            ScoreValue::Integer(value) => Ok(*value),
            ScoreValue::Float(value) => whole_number(*value).ok_or_else(invalid),
            ScoreValue::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
                    .ok_or_else(invalid)
            }
        }
    }
}

fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// POST /api/scores body
///
/// Every field is optional at the JSON level so missing fields are
/// reported together as a validation error.
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    #[serde(alias = "device_id", alias = "deviceId")]
    pub identity: Option<String>,
    #[serde(alias = "displayName", alias = "player")]
    pub name: Option<String>,
    pub country: Option<String>,
    pub score: Option<ScoreValue>,
    pub platform: Option<String>,
}

impl SubmitScoreRequest {
    pub fn into_submission(self) -> Result<Submission, Error> {
        match (self.identity, self.name, self.country, self.score, self.platform) {
            (Some(identity), Some(name), Some(country), Some(score), Some(platform)) => {
                Ok(Submission {
                    identity,
                    name,
                    country,
                    score: score.to_score()?,
                    platform,
                })
            }
            (identity, name, country, score, platform) => {
                let missing: Vec<&str> = [
                    ("identity", identity.is_none()),
                    ("name", name.is_none()),
                    ("country", country.is_none()),
                    ("score", score.is_none()),
                    ("platform", platform.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(field, _)| field)
                .collect();

                Err(Error::Validation(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitScoreResponse {
    pub status: SubmitStatus,
    pub message: String,
    pub record: ScoreRecord,
}

fn status_message(status: SubmitStatus) -> &'static str {
    match status {
        SubmitStatus::Created => "High score added successfully",
        SubmitStatus::Updated => "High score updated successfully",
        SubmitStatus::Unchanged => "High score not updated (current score is higher)",
    }
}

/// POST /api/scores
///
/// 201 for a new record, 200 for updated or unchanged.
pub async fn submit_score(
    State(state): State<AppState>,
    payload: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitScoreResponse>), ApiError> {
    let Json(request) = payload?;
    let submission = request.into_submission()?;

    let outcome = state.service.submit(&submission).await?;

    let code = match outcome.status {
        SubmitStatus::Created => StatusCode::CREATED,
        SubmitStatus::Updated | SubmitStatus::Unchanged => StatusCode::OK,
    };

    Ok((
        code,
        Json(SubmitScoreResponse {
            status: outcome.status,
            message: status_message(outcome.status).to_string(),
            record: outcome.record,
        }),
    ))
}

/// Query parameters for leaderboard retrieval
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of entries (default 10, capped by configuration)
    pub limit: Option<u32>,
}

/// GET /api/scores, GET /leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedScore>>, ApiError> {
    let Query(query) = query?;
    let leaderboard = state.service.get_leaderboard(query.limit).await?;
    Ok(Json(leaderboard))
}

#[derive(Debug, Deserialize)]
pub struct CheckNameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckNameResponse {
    pub available: bool,
    pub message: String,
}

/// POST /api/check-name
///
/// Advisory: an available name is not reserved.
pub async fn check_name(
    State(state): State<AppState>,
    payload: Result<Json<CheckNameRequest>, JsonRejection>,
) -> Result<Json<CheckNameResponse>, ApiError> {
    let Json(request) = payload?;
    let name = request.name.unwrap_or_default();

    let available = state.service.check_name_availability(&name).await?;
    let message = if available {
        "Name is available"
    } else {
        "This name is already taken. Please choose another one."
    };

    Ok(Json(CheckNameResponse {
        available,
        message: message.to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ClearScoresResponse {
    pub message: String,
    pub deleted: u64,
}

/// DELETE /api/scores
///
/// Removes every record. Administrative; not reversible.
pub async fn clear_scores(
    State(state): State<AppState>,
) -> Result<Json<ClearScoresResponse>, ApiError> {
    let deleted = state.service.clear_all().await?;
    info!("Clear request removed {} scores", deleted);

    Ok(Json(ClearScoresResponse {
        message: "All scores deleted successfully".to_string(),
        deleted,
    }))
}
