//! Score record models and submission types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One stored high score, keyed by device identity
///
/// Field names are the wire contract used by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    /// Opaque per-device token, unique across records
    pub identity: String,
    /// Player-chosen name, unique across records (case-sensitive)
    pub display_name: String,
    pub country: String,
    /// Best score ever accepted for this identity
    pub score: i64,
    pub platform: String,
    /// Time of the last accepted submission
    pub submitted_at: DateTime<Utc>,
}

/// A record together with its position in the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedScore {
    /// 1-based position in score-descending order
    pub rank: u32,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

impl RankedScore {
    /// Attach ranks to records already sorted best-first
    pub fn rank_all(records: Vec<ScoreRecord>) -> Vec<RankedScore> {
        records
            .into_iter()
            .zip(1u32..)
            .map(|(record, rank)| RankedScore { rank, record })
            .collect()
    }
}

/// Fields written when a new identity submits for the first time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub identity: String,
    pub display_name: String,
    pub country: String,
    pub score: i64,
    pub platform: String,
}

/// Mutable fields overwritten when an identity beats its own score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub score: i64,
    pub display_name: String,
    pub country: String,
    pub platform: String,
}

/// A score submission as received from a game client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub identity: String,
    pub name: String,
    pub country: String,
    pub score: i64,
    pub platform: String,
}

impl Submission {
    /// Reject blank fields and non-positive scores
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("identity", &self.identity),
            ("name", &self.name),
            ("country", &self.country),
            ("platform", &self.platform),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();

        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if self.score <= 0 {
            return Err(Error::Validation(format!(
                "score must be a positive whole number, got {}",
                self.score
            )));
        }

        Ok(())
    }

    pub fn to_new_score(&self) -> NewScore {
        NewScore {
            identity: self.identity.clone(),
            display_name: self.name.clone(),
            country: self.country.clone(),
            score: self.score,
            platform: self.platform.clone(),
        }
    }

    pub fn to_update(&self) -> ScoreUpdate {
        ScoreUpdate {
            score: self.score,
            display_name: self.name.clone(),
            country: self.country.clone(),
            platform: self.platform.clone(),
        }
    }
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    /// First score from this identity
    Created,
    /// Strictly higher score replaced the stored one
    Updated,
    /// Score did not beat the stored one; nothing written
    Unchanged,
}
