//! Runtime configuration loaded from environment variables.

use crate::db::DbOptions;
use crate::logging::default_log_level;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "roster.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Roster configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    /// SQLite database file (default: "roster.db")
    pub db_path: PathBuf,
    /// Lock wait before a writer fails with `LockTimeout` (default: 5s)
    pub busy_timeout: Duration,
    /// Log level passed to `init_logging` (default: build-mode dependent)
    pub log_level: String,
    /// Absolute log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl RosterConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_DB_PATH` - SQLite database path (default: "roster.db")
    /// - `ROSTER_BUSY_TIMEOUT_MS` - busy timeout in milliseconds (default: 5000)
    /// - `ROSTER_LOG_LEVEL` - trace|debug|info|warn|error
    /// - `ROSTER_LOG_DIR` - absolute directory for rotated log files
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let busy_timeout_ms = match get("ROSTER_BUSY_TIMEOUT_MS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "ROSTER_BUSY_TIMEOUT_MS",
                    value,
                    reason: "expected milliseconds as an unsigned integer",
                })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            db_path: get("ROSTER_DB_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            log_level: get("ROSTER_LOG_LEVEL")
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get("ROSTER_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Connection options derived from this configuration.
    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: self.busy_timeout,
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}
