//! Score store contract
//!
//! The store owns every score record and is the only place the identity
//! and display-name uniqueness rules are enforced. Implementations must
//! make those checks atomic with the write (a constraint, not a
//! read-then-write), so concurrent inserts on the same key produce exactly
//! one success.

use async_trait::async_trait;
use scoreboard_common::{NewScore, Result, ScoreRecord, ScoreUpdate};

mod sqlite;

pub use sqlite::SqliteScoreStore;

/// Durable collection of score records
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Record owned by `identity`, if any
    async fn find_by_identity(&self, identity: &str) -> Result<Option<ScoreRecord>>;

    /// Record currently using `name`, if any
    async fn find_by_name(&self, name: &str) -> Result<Option<ScoreRecord>>;

    /// Create a record
    ///
    /// # Errors
    /// * `Error::Conflict` - identity or display name already stored
    async fn insert(&self, score: &NewScore) -> Result<ScoreRecord>;

    /// Overwrite the mutable fields of the record owned by `identity`, but
    /// only while its stored score is below `update.score`
    ///
    /// Returns `None`, writing nothing, when the stored score is already at
    /// least as high.
    ///
    /// # Errors
    /// * `Error::NotFound` - no record for `identity`
    /// * `Error::Conflict` - new display name belongs to another record
    async fn update_score(
        &self,
        identity: &str,
        update: &ScoreUpdate,
    ) -> Result<Option<ScoreRecord>>;

    /// Best `n` records, score descending, earliest insert first on ties
    async fn top_n(&self, n: u32) -> Result<Vec<ScoreRecord>>;

    /// Remove every record, returning how many were removed
    async fn clear_all(&self) -> Result<u64>;

    /// Number of stored records
    async fn count(&self) -> Result<i64>;
}
