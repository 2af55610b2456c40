//! Configuration loading and resolution
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LEADERBOARD_MAX_LIMIT: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Server configuration as read from `config.toml`
///
/// Every key is optional in the file; absent keys take compiled defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardConfig {
    pub bind_address: String,
    pub port: u16,
    /// SQLite file; `None` means the platform data directory
    pub database_path: Option<PathBuf>,
    /// Upper bound applied to the leaderboard `limit` parameter
    pub leaderboard_max_limit: u32,
    pub request_timeout_secs: u64,
    pub max_connections: u32,
    pub log_level: String,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            database_path: None,
            leaderboard_max_limit: DEFAULT_LEADERBOARD_MAX_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ScoreboardConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a TOML file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Layer environment and command-line overrides on top of file values
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(addr) = &overrides.bind_address {
            self.bind_address = addr.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = &overrides.database_path {
            self.database_path = Some(path.clone());
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
        if let Some(limit) = overrides.leaderboard_max_limit {
            self.leaderboard_max_limit = limit;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(max) = overrides.max_connections {
            self.max_connections = max;
        }
        self
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.leaderboard_max_limit == 0 {
            return Err(Error::Config(
                "leaderboard_max_limit must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Configured database path, or the platform default
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// `host:port` string for the HTTP listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Overrides from the environment or the command line (unset fields leave the file value)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub leaderboard_max_limit: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub max_connections: Option<u32>,
}

impl ConfigOverrides {
    /// Read `SCOREBOARD_*` variables (and the conventional `PORT`)
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        let port = std::env::var("SCOREBOARD_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|raw| parse_env_number("port", raw));

        Self {
            bind_address: std::env::var("SCOREBOARD_BIND_ADDRESS").ok(),
            port,
            database_path: std::env::var("SCOREBOARD_DATABASE_PATH")
                .ok()
                .map(PathBuf::from),
            log_level: std::env::var("SCOREBOARD_LOG_LEVEL").ok(),
            leaderboard_max_limit: env_number("SCOREBOARD_LEADERBOARD_MAX_LIMIT"),
            request_timeout_secs: env_number("SCOREBOARD_REQUEST_TIMEOUT_SECS"),
            max_connections: env_number("SCOREBOARD_MAX_CONNECTIONS"),
        }
    }

    /// Combine two override sets; `self` wins where both are set
    pub fn or(self, fallback: ConfigOverrides) -> Self {
        Self {
            bind_address: self.bind_address.or(fallback.bind_address),
            port: self.port.or(fallback.port),
            database_path: self.database_path.or(fallback.database_path),
            log_level: self.log_level.or(fallback.log_level),
            leaderboard_max_limit: self.leaderboard_max_limit.or(fallback.leaderboard_max_limit),
            request_timeout_secs: self.request_timeout_secs.or(fallback.request_timeout_secs),
            max_connections: self.max_connections.or(fallback.max_connections),
        }
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var)
        .ok()
        .and_then(|raw| parse_env_number(var, raw))
}

fn parse_env_number<T: std::str::FromStr>(name: &str, raw: String) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {} in environment: {}", name, raw);
            None
        }
    }
}

/// Load the TOML layer of the configuration
///
/// An explicit path must exist. Without one, the platform config file is
/// used when present; a missing default file is not an error.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ScoreboardConfig> {
    if let Some(path) = explicit_path {
        info!("Loading config file: {}", path.display());
        return ScoreboardConfig::load(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config file: {}", path.display());
            ScoreboardConfig::load(&path)
        }
        Some(path) => {
            warn!(
                "No config file at {}; using compiled defaults",
                path.display()
            );
            Ok(ScoreboardConfig::default())
        }
        None => {
            warn!("Could not determine config directory; using compiled defaults");
            Ok(ScoreboardConfig::default())
        }
    }
}

/// Platform config file location (`<config_dir>/scoreboard/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scoreboard").join("config.toml"))
}

/// Platform database location (`<data_local_dir>/scoreboard/scores.db`)
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scoreboard"))
        .unwrap_or_else(|| PathBuf::from("./scoreboard_data"))
        .join("scores.db")
}
