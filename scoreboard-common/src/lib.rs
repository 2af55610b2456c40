//! # Scoreboard Common Library
//!
//! Shared code for the scoreboard service including:
//! - Score record models and submission types
//! - Error taxonomy (validation, conflict, not found, store unavailable)
//! - Configuration loading
//! - Database initialization
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result, UniqueKey};
pub use models::{NewScore, RankedScore, ScoreRecord, ScoreUpdate, SubmitStatus, Submission};
