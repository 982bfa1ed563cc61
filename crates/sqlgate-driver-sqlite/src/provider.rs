//! Connection provider backed by SQLite

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlgate_core::{Connection, ConnectionConfig, ConnectionProvider, Result, SqlGateError};

use crate::{SqliteConfig, SqliteConnection};

/// Hands out SQLite connections, one per unit of work
///
/// An in-memory database only exists as long as its connection, so for
/// `:memory:` every unit of work shares one long-lived connection. File
/// databases get a fresh connection per [`acquire`](ConnectionProvider::acquire),
/// closed again on release.
pub struct SqliteConnectionProvider {
    config: SqliteConfig,
    shared: Option<Arc<SqliteConnection>>,
    outstanding: AtomicUsize,
}

impl SqliteConnectionProvider {
    /// Create a provider; in-memory databases are opened immediately
    pub fn new(config: SqliteConfig) -> Result<Self> {
        let shared = if config.is_memory() {
            Some(Arc::new(SqliteConnection::open(&config)?))
        } else {
            None
        };

        tracing::info!(path = %config.path, shared = shared.is_some(), "SQLite provider created");
        Ok(Self {
            config,
            shared,
            outstanding: AtomicUsize::new(0),
        })
    }

    /// Provider over a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::new(SqliteConfig::memory())
    }

    /// Provider built from a generic connection configuration
    pub fn from_connection_config(config: &ConnectionConfig) -> Result<Self> {
        Self::new(SqliteConfig::from_connection_config(config)?)
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Connections currently checked out
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn acquire(&self) -> Result<Arc<dyn Connection>> {
        let connection: Arc<dyn Connection> = match &self.shared {
            Some(shared) => {
                if shared.is_closed() {
                    return Err(SqlGateError::Connection(
                        "shared in-memory connection is closed".into(),
                    ));
                }
                shared.clone()
            }
            None => Arc::new(SqliteConnection::open(&self.config)?),
        };

        let outstanding = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(outstanding, "SQLite connection acquired");
        Ok(connection)
    }

    fn release(&self, connection: Arc<dyn Connection>) -> Result<()> {
        match self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => tracing::trace!(outstanding = previous - 1, "SQLite connection released"),
            Err(_) => tracing::warn!("SQLite connection released without a matching acquire"),
        }

        if self.shared.is_some() {
            return Ok(());
        }
        connection
            .close()
            .map_err(|e| SqlGateError::Connection(format!("Failed to close connection: {}", e)))
    }
}
