//! Connection scoped to a single statement execution

use std::ops::Deref;
use std::sync::Arc;

use sqlgate_core::{Connection, ConnectionProvider, Result};

/// A connection checked out from a provider for one call
///
/// When dropped, the connection is handed back to the provider exactly once,
/// whichever way the call exits.
pub(crate) struct ScopedConnection<'p> {
    connection: Option<Arc<dyn Connection>>,
    provider: &'p dyn ConnectionProvider,
}

impl<'p> ScopedConnection<'p> {
    /// Acquire a connection; provider failures propagate unchanged
    pub(crate) fn acquire(provider: &'p dyn ConnectionProvider) -> Result<Self> {
        let connection = provider.acquire()?;
        tracing::trace!(driver = connection.driver_name(), "connection acquired");
        Ok(Self {
            connection: Some(connection),
            provider,
        })
    }
}

impl Deref for ScopedConnection<'_> {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref().expect("connection taken").as_ref()
    }
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            match self.provider.release(conn) {
                Ok(()) => tracing::trace!("connection released"),
                Err(e) => tracing::warn!(error = %e, "failed to release connection"),
            }
        }
    }
}
