//! Runtime configuration for embedding the plan store.
//!
//! Reads from the environment:
//! - `PLANBOARD_DB_PATH`: SQLite file path; unset or blank means in-memory.
//! - `PLANBOARD_LOG_LEVEL`: `trace|debug|info|warn|error`; defaults per
//!   build mode.
//! - `PLANBOARD_LOG_DIR`: absolute directory for rolling logs; unset means
//!   file logging stays off.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "PLANBOARD_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "PLANBOARD_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PLANBOARD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (useful for tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            db_path: non_blank(DB_PATH_ENV).map(PathBuf::from),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is left disabled.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
