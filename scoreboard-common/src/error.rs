//! Common error types for the scoreboard

use std::fmt;

use thiserror::Error;

/// Common result type for scoreboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unique key of the `scores` table that a write collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Identity,
    DisplayName,
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueKey::Identity => write!(f, "identity"),
            UniqueKey::DisplayName => write!(f, "display name"),
        }
    }
}

/// Error taxonomy shared by the score store, the submission service and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input (caller's fault, retrying will not help)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Uniqueness violation raised by the store
    #[error("Conflict on {key}: {value}")]
    Conflict { key: UniqueKey, value: String },

    /// Display name already belongs to another identity
    #[error("Name already taken: {0}")]
    NameTaken(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage unreachable, locked or out of connections (transient)
    #[error("Score store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure is transient and the transport may retry the request
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}

// SQLite primary result codes for a busy or locked database. sqlx reports the
// extended code, whose low byte is the primary code.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Error::StoreUnavailable(err.to_string())
            }
            sqlx::Error::Io(ref e) => Error::StoreUnavailable(e.to_string()),
            sqlx::Error::Database(ref db_err) => {
                if db_err.is_unique_violation() {
                    let message = db_err.message();
                    let key = if message.contains("scores.display_name") {
                        UniqueKey::DisplayName
                    } else {
                        UniqueKey::Identity
                    };
                    return Error::Conflict {
                        key,
                        value: message.to_string(),
                    };
                }

                let primary_code = db_err
                    .code()
                    .and_then(|code| code.parse::<i64>().ok())
                    .map(|code| code & 0xff);
                match primary_code {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => {
                        Error::StoreUnavailable(db_err.message().to_string())
                    }
                    _ => Error::Database(err),
                }
            }
            other => Error::Database(other),
        }
    }
}
