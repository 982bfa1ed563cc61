//! SQLite connection settings

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlgate_core::{ConnectionConfig, Result, SqlGateError};

/// Path used for a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Settings applied when a SQLite connection is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file path, `file:` URI or `:memory:`
    pub path: String,
    /// Enforce foreign key constraints
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
    /// Journal mode for file databases (ignored for `:memory:`)
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    /// How long a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_foreign_keys() -> bool {
    true
}

fn default_journal_mode() -> String {
    "WAL".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl SqliteConfig {
    /// Settings for a database file at `path`
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            foreign_keys: default_foreign_keys(),
            journal_mode: default_journal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Settings for an in-memory database
    pub fn memory() -> Self {
        Self::file(MEMORY_PATH)
    }

    /// Build SQLite settings from a generic connection configuration
    ///
    /// Reads `path` (or `database`), plus the optional `foreign_keys`,
    /// `journal_mode` and `busy_timeout_ms` parameters.
    pub fn from_connection_config(config: &ConnectionConfig) -> Result<Self> {
        if config.driver != "sqlite" {
            return Err(SqlGateError::Configuration(format!(
                "expected a sqlite configuration, got driver '{}'",
                config.driver
            )));
        }

        let path = config
            .get_string("path")
            .or_else(|| config.get_string("database"))
            .ok_or_else(|| SqlGateError::Configuration(
                "SQLite requires 'path' or 'database' parameter. Example: { \"path\": \"/path/to/database.db\" }".into()
            ))?;

        let mut settings = Self::file(path);
        if let Some(foreign_keys) = config.get_bool("foreign_keys") {
            settings.foreign_keys = foreign_keys;
        }
        if let Some(mode) = config.get_string("journal_mode") {
            settings.journal_mode = mode;
        }
        if let Some(timeout) = config.get_u64("busy_timeout_ms") {
            settings.busy_timeout_ms = timeout;
        }
        Ok(settings)
    }

    /// Whether this describes a private in-memory database
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_journal_mode(mut self, mode: impl Into<String>) -> Self {
        self.journal_mode = mode.into();
        self
    }

    pub fn with_busy_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::memory()
    }
}
