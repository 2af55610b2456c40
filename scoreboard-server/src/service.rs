//! Submission service
//!
//! Stateless decision layer between the HTTP handlers and the score store.
//! For each submission it decides whether to insert, update or leave the
//! stored record alone, and translates store conflicts into `NameTaken`.

use std::sync::Arc;

use scoreboard_common::{
    Error, RankedScore, Result, ScoreRecord, SubmitStatus, Submission, UniqueKey,
};
use tracing::{error, info, warn};

use crate::store::ScoreStore;

/// Number of leaderboard entries returned when the caller gives no limit
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

/// Accepted submission: the stored record and what happened to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub status: SubmitStatus,
    pub record: ScoreRecord,
}

/// Decides how each submission changes the store
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn ScoreStore>,
    max_limit: u32,
}

impl SubmissionService {
    /// Create a service over `store`, capping leaderboard requests at `max_limit`
    pub fn new(store: Arc<dyn ScoreStore>, max_limit: u32) -> Self {
        Self { store, max_limit }
    }

    /// Handle one score submission
    ///
    /// # Errors
    /// * `Error::Validation` - blank field or non-positive score
    /// * `Error::NameTaken` - name belongs to a different identity
    /// * `Error::StoreUnavailable` / `Error::Database` - store failure
    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        submission.validate()?;

        let existing = self
            .store
            .find_by_identity(&submission.identity)
            .await
            .map_err(|e| log_store_error("lookup", e))?;

        match existing {
            None => self.create(submission).await,
            Some(record) => self.resolve_existing(submission, record).await,
        }
    }

    async fn create(&self, submission: &Submission) -> Result<SubmitOutcome> {
        match self.store.insert(&submission.to_new_score()).await {
            Ok(record) => {
                info!(
                    "Created score {} for {} ({})",
                    record.score, record.display_name, record.identity
                );
                Ok(SubmitOutcome {
                    status: SubmitStatus::Created,
                    record,
                })
            }
            Err(Error::Conflict { key, value }) => {
                // Either the name belongs to someone else, or a concurrent
                // first submission from this device committed first. SQLite
                // reports only one violated key, so look the identity up.
                let winner = self
                    .store
                    .find_by_identity(&submission.identity)
                    .await
                    .map_err(|e| log_store_error("lookup", e))?;
                match winner {
                    Some(record) => self.resolve_existing(submission, record).await,
                    None if key == UniqueKey::DisplayName => Err(name_taken(submission)),
                    None => Err(Error::Conflict { key, value }),
                }
            }
            Err(e) => Err(log_store_error("insert", e)),
        }
    }

    async fn resolve_existing(
        &self,
        submission: &Submission,
        stored: ScoreRecord,
    ) -> Result<SubmitOutcome> {
        if submission.name != stored.display_name {
            let owner = self
                .store
                .find_by_name(&submission.name)
                .await
                .map_err(|e| log_store_error("name lookup", e))?;
            if owner.is_some_and(|owner| owner.identity != submission.identity) {
                return Err(name_taken(submission));
            }
        }

        if submission.score <= stored.score {
            return Ok(SubmitOutcome {
                status: SubmitStatus::Unchanged,
                record: stored,
            });
        }

        match self
            .store
            .update_score(&submission.identity, &submission.to_update())
            .await
        {
            Ok(Some(record)) => {
                info!(
                    "Updated score for {} ({}): {} -> {}",
                    record.display_name, record.identity, stored.score, record.score
                );
                Ok(SubmitOutcome {
                    status: SubmitStatus::Updated,
                    record,
                })
            }
            Ok(None) => {
                // A concurrent submission for this device stored an equal or
                // higher score after the lookup above
                let current = self
                    .store
                    .find_by_identity(&submission.identity)
                    .await
                    .map_err(|e| log_store_error("lookup", e))?
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "no score recorded for identity {}",
                            submission.identity
                        ))
                    })?;
                Ok(SubmitOutcome {
                    status: SubmitStatus::Unchanged,
                    record: current,
                })
            }
            Err(Error::Conflict {
                key: UniqueKey::DisplayName,
                ..
            }) => Err(name_taken(submission)),
            Err(e) => Err(log_store_error("update", e)),
        }
    }

    /// Whether `name` is currently unused
    ///
    /// Advisory only: the name is not reserved, and a later submission can
    /// still fail with `NameTaken`.
    pub async fn check_name_availability(&self, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let owner = self
            .store
            .find_by_name(name)
            .await
            .map_err(|e| log_store_error("name lookup", e))?;

        Ok(owner.is_none())
    }

    /// Best scores with derived ranks
    ///
    /// `limit` defaults to 10 and is capped at the configured maximum.
    pub async fn get_leaderboard(&self, limit: Option<u32>) -> Result<Vec<RankedScore>> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .min(self.max_limit);

        let records = self
            .store
            .top_n(limit)
            .await
            .map_err(|e| log_store_error("leaderboard query", e))?;

        Ok(RankedScore::rank_all(records))
    }

    /// Delete every score (administrative, irreversible)
    pub async fn clear_all(&self) -> Result<u64> {
        let removed = self
            .store
            .clear_all()
            .await
            .map_err(|e| log_store_error("clear", e))?;

        warn!("Cleared all scores ({} records removed)", removed);
        Ok(removed)
    }

    /// Number of stored records
    pub async fn record_count(&self) -> Result<i64> {
        self.store.count().await
    }
}

fn name_taken(submission: &Submission) -> Error {
    warn!(
        "Rejected name '{}' for {}: already taken",
        submission.name, submission.identity
    );
    Error::NameTaken(submission.name.clone())
}

fn log_store_error(operation: &str, err: Error) -> Error {
    error!("Score store {} failed: {}", operation, err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteScoreStore;
    use async_trait::async_trait;
    use scoreboard_common::db::init::init_in_memory;
    use scoreboard_common::{NewScore, ScoreUpdate};

    async fn setup_service() -> SubmissionService {
        let store = SqliteScoreStore::new(init_in_memory().await.unwrap());
        SubmissionService::new(Arc::new(store), 100)
    }

    fn submission(identity: &str, name: &str, score: i64) -> Submission {
        Submission {
            identity: identity.to_string(),
            name: name.to_string(),
            country: "NZ".to_string(),
            score,
            platform: "android".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ace_scenario() {
        let service = setup_service().await;

        let out = service.submit(&submission("A", "Ace", 50)).await.unwrap();
        assert_eq!(out.status, SubmitStatus::Created);
        assert_eq!(out.record.score, 50);

        let out = service.submit(&submission("A", "Ace", 30)).await.unwrap();
        assert_eq!(out.status, SubmitStatus::Unchanged);
        assert_eq!(out.record.score, 50);

        let out = service.submit(&submission("A", "Ace", 80)).await.unwrap();
        assert_eq!(out.status, SubmitStatus::Updated);
        assert_eq!(out.record.score, 80);

        let err = service.submit(&submission("B", "Ace", 10)).await.unwrap_err();
        assert!(matches!(err, Error::NameTaken(ref name) if name == "Ace"));
        assert_eq!(service.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_equal_score_is_unchanged() {
        let service = setup_service().await;
        service.submit(&submission("A", "Ace", 50)).await.unwrap();

        let mut again = submission("A", "Ace", 50);
        again.country = "US".to_string();
        let out = service.submit(&again).await.unwrap();

        assert_eq!(out.status, SubmitStatus::Unchanged);
        assert_eq!(out.record.country, "NZ");
    }

    #[tokio::test]
    async fn test_validation_runs_before_store() {
        let service = setup_service().await;

        let err = service.submit(&submission("", "Ace", 10)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = service.submit(&submission("A", "Ace", 0)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert_eq!(service.record_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_into_taken_name_rejected_regardless_of_score() {
        let service = setup_service().await;
        service.submit(&submission("A", "Ace", 50)).await.unwrap();
        service.submit(&submission("B", "Bolt", 500)).await.unwrap();

        // Lower score than stored: still rejected, not "unchanged"
        let err = service.submit(&submission("B", "Ace", 10)).await.unwrap_err();
        assert!(matches!(err, Error::NameTaken(_)));

        // Higher score: rejected, nothing written
        let err = service.submit(&submission("B", "Ace", 900)).await.unwrap_err();
        assert!(matches!(err, Error::NameTaken(_)));

        let leaderboard = service.get_leaderboard(None).await.unwrap();
        assert_eq!(leaderboard[0].record.display_name, "Bolt");
        assert_eq!(leaderboard[0].record.score, 500);
    }

    #[tokio::test]
    async fn test_rename_to_free_name_on_higher_score() {
        let service = setup_service().await;
        service.submit(&submission("A", "Ace", 50)).await.unwrap();

        let out = service.submit(&submission("A", "Ace2", 60)).await.unwrap();
        assert_eq!(out.status, SubmitStatus::Updated);
        assert_eq!(out.record.display_name, "Ace2");

        assert!(service.check_name_availability("Ace").await.unwrap());
        assert!(!service.check_name_availability("Ace2").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_name_requires_name() {
        let service = setup_service().await;
        let err = service.check_name_availability("  ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_leaderboard_limit_capped() {
        let store = SqliteScoreStore::new(init_in_memory().await.unwrap());
        let service = SubmissionService::new(Arc::new(store), 3);
        for i in 1..=5 {
            service
                .submit(&submission(&format!("d{}", i), &format!("P{}", i), i))
                .await
                .unwrap();
        }

        let board = service.get_leaderboard(Some(50)).await.unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].record.score, 5);

        assert!(service.get_leaderboard(Some(0)).await.unwrap().is_empty());
    }

    /// Store whose backend is always unreachable
    struct UnavailableStore;

    #[async_trait]
    impl ScoreStore for UnavailableStore {
        async fn find_by_identity(&self, _identity: &str) -> Result<Option<ScoreRecord>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn find_by_name(&self, _name: &str) -> Result<Option<ScoreRecord>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn insert(&self, _score: &NewScore) -> Result<ScoreRecord> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn update_score(
            &self,
            _identity: &str,
            _update: &ScoreUpdate,
        ) -> Result<Option<ScoreRecord>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn top_n(&self, _n: u32) -> Result<Vec<ScoreRecord>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn clear_all(&self) -> Result<u64> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        async fn count(&self) -> Result<i64> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let service = SubmissionService::new(Arc::new(UnavailableStore), 100);

        let err = service.submit(&submission("A", "Ace", 5)).await.unwrap_err();
        assert!(err.is_transient());

        let err = service.get_leaderboard(None).await.unwrap_err();
        assert!(err.is_transient());

        let err = service.check_name_availability("Ace").await.unwrap_err();
        assert!(err.is_transient());
    }

    /// Store that reports an identity collision on insert, as when another
    /// request for the same device commits first
    struct LostInsertRaceStore {
        inner: SqliteScoreStore,
    }

    #[async_trait]
    impl ScoreStore for LostInsertRaceStore {
        async fn find_by_identity(&self, identity: &str) -> Result<Option<ScoreRecord>> {
            self.inner.find_by_identity(identity).await
        }
        async fn find_by_name(&self, name: &str) -> Result<Option<ScoreRecord>> {
            self.inner.find_by_name(name).await
        }
        async fn insert(&self, score: &NewScore) -> Result<ScoreRecord> {
            let winner = NewScore {
                display_name: format!("{}-first", score.display_name),
                score: 40,
                ..score.clone()
            };
            self.inner.insert(&winner).await?;
            self.inner.insert(score).await
        }
        async fn update_score(
            &self,
            identity: &str,
            update: &ScoreUpdate,
        ) -> Result<Option<ScoreRecord>> {
            self.inner.update_score(identity, update).await
        }
        async fn top_n(&self, n: u32) -> Result<Vec<ScoreRecord>> {
            self.inner.top_n(n).await
        }
        async fn clear_all(&self) -> Result<u64> {
            self.inner.clear_all().await
        }
        async fn count(&self) -> Result<i64> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_identity_race_on_insert_resolves_against_winner() {
        let inner = SqliteScoreStore::new(init_in_memory().await.unwrap());
        let service = SubmissionService::new(Arc::new(LostInsertRaceStore { inner }), 100);

        let out = service.submit(&submission("A", "Ace", 70)).await.unwrap();
        assert_eq!(out.status, SubmitStatus::Updated);
        assert_eq!(out.record.score, 70);
        assert_eq!(out.record.display_name, "Ace");
        assert_eq!(service.record_count().await.unwrap(), 1);
    }

    /// Store where another request for the same device commits a higher
    /// score right after the service reads the stored record
    struct OvertakenStore {
        inner: SqliteScoreStore,
    }

    #[async_trait]
    impl ScoreStore for OvertakenStore {
        async fn find_by_identity(&self, identity: &str) -> Result<Option<ScoreRecord>> {
            let snapshot = self.inner.find_by_identity(identity).await?;
            if snapshot.as_ref().is_some_and(|r| r.score < 80) {
                let winner = ScoreUpdate {
                    score: 80,
                    display_name: "Winner".to_string(),
                    country: "SE".to_string(),
                    platform: "web".to_string(),
                };
                self.inner.update_score(identity, &winner).await?;
            }
            Ok(snapshot)
        }
        async fn find_by_name(&self, name: &str) -> Result<Option<ScoreRecord>> {
            self.inner.find_by_name(name).await
        }
        async fn insert(&self, score: &NewScore) -> Result<ScoreRecord> {
            self.inner.insert(score).await
        }
        async fn update_score(
            &self,
            identity: &str,
            update: &ScoreUpdate,
        ) -> Result<Option<ScoreRecord>> {
            self.inner.update_score(identity, update).await
        }
        async fn top_n(&self, n: u32) -> Result<Vec<ScoreRecord>> {
            self.inner.top_n(n).await
        }
        async fn clear_all(&self) -> Result<u64> {
            self.inner.clear_all().await
        }
        async fn count(&self) -> Result<i64> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_lower_score_overtaken_mid_submit_leaves_record_alone() {
        let inner = SqliteScoreStore::new(init_in_memory().await.unwrap());
        inner
            .insert(&NewScore {
                identity: "A".to_string(),
                display_name: "Ace".to_string(),
                country: "NZ".to_string(),
                score: 50,
                platform: "android".to_string(),
            })
            .await
            .unwrap();
        let store = OvertakenStore {
            inner: inner.clone(),
        };
        let service = SubmissionService::new(Arc::new(store), 100);

        let mut late = submission("A", "Loser", 70);
        late.country = "US".to_string();
        late.platform = "ios".to_string();
        let out = service.submit(&late).await.unwrap();

        assert_eq!(out.status, SubmitStatus::Unchanged);
        assert_eq!(out.record.score, 80);
        assert_eq!(out.record.display_name, "Winner");

        let stored = inner.find_by_identity("A").await.unwrap().unwrap();
        assert_eq!(stored.score, 80);
        assert_eq!(stored.display_name, "Winner");
        assert_eq!(stored.country, "SE");
        assert_eq!(stored.platform, "web");
        assert!(inner.find_by_name("Loser").await.unwrap().is_none());
    }
}
