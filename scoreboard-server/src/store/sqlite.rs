//! SQLite-backed score store

use async_trait::async_trait;
use scoreboard_common::{time, Error, NewScore, Result, ScoreRecord, ScoreUpdate};
use sqlx::SqlitePool;
use tracing::debug;

use super::ScoreStore;

const RECORD_COLUMNS: &str = "identity, display_name, country, score, platform, submitted_at";

/// Score store over the `scores` table
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct SqliteScoreStore {
    pool: SqlitePool,
}

impl SqliteScoreStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<ScoreRecord>> {
        debug!("Looking up score for identity {}", identity);

        let record = sqlx::query_as::<_, ScoreRecord>(&format!(
            "SELECT {} FROM scores WHERE identity = ?",
            RECORD_COLUMNS
        ))
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ScoreRecord>> {
        let record = sqlx::query_as::<_, ScoreRecord>(&format!(
            "SELECT {} FROM scores WHERE display_name = ?",
            RECORD_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert(&self, score: &NewScore) -> Result<ScoreRecord> {
        // UNIQUE(identity) and UNIQUE(display_name) decide races here
        let record = sqlx::query_as::<_, ScoreRecord>(&format!(
            r#"
            INSERT INTO scores (identity, display_name, country, score, platform, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(&score.identity)
        .bind(&score.display_name)
        .bind(&score.country)
        .bind(score.score)
        .bind(&score.platform)
        .bind(time::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_score(
        &self,
        identity: &str,
        update: &ScoreUpdate,
    ) -> Result<Option<ScoreRecord>> {
        let mut tx = self.pool.begin().await?;

        // Guarded write: a submission that lost a race to an equal or higher
        // score leaves every column untouched
        let record = sqlx::query_as::<_, ScoreRecord>(&format!(
            r#"
            UPDATE scores
            SET score = ?,
                display_name = ?,
                country = ?,
                platform = ?,
                submitted_at = ?
            WHERE identity = ? AND score < ?
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(update.score)
        .bind(&update.display_name)
        .bind(&update.country)
        .bind(&update.platform)
        .bind(time::now())
        .bind(identity)
        .bind(update.score)
        .fetch_optional(&mut *tx)
        .await?;

        if record.is_none() {
            let matching: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM scores WHERE identity = ?")
                    .bind(identity)
                    .fetch_one(&mut *tx)
                    .await?;
            if matching == 0 {
                return Err(Error::NotFound(format!(
                    "no score recorded for identity {}",
                    identity
                )));
            }
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn top_n(&self, n: u32) -> Result<Vec<ScoreRecord>> {
        let records = sqlx::query_as::<_, ScoreRecord>(&format!(
            "SELECT {} FROM scores ORDER BY score DESC, id ASC LIMIT ?",
            RECORD_COLUMNS
        ))
        .bind(i64::from(n))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scores")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
