//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and makes sure the
//! `scores` table exists. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a connection waits for the write lock before reporting busy
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for a free pooled connection
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database file and create the schema if needed
pub async fn init_database(db_path: &Path, max_connections: u32) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets readers proceed while one writer holds the lock
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_scores_table(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the schema applied
///
/// The pool holds exactly one connection that never expires, since every
/// new in-memory connection would see an empty database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_scores_table(&pool).await?;

    Ok(pool)
}

/// Create the scores table
///
/// The two UNIQUE constraints are the authority for identity and name
/// uniqueness. `id` records insertion order for tie-breaking.
pub async fn create_scores_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identity TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL UNIQUE,
            country TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score > 0),
            platform TEXT NOT NULL,
            submitted_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_ranking ON scores (score DESC, id ASC)")
        .execute(pool)
        .await?;

    Ok(())
}
