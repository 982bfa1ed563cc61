//! Connection, statement and cursor traits implemented by drivers

use std::collections::VecDeque;
use std::sync::Arc;

use crate::{DriverResult, Result, Row, Value};

/// Whether a statement should report database-generated keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRequest<'a> {
    /// No generated keys are needed
    None,
    /// Report the values the database assigned to this column
    Column(&'a str),
}

impl KeyRequest<'_> {
    pub fn column(&self) -> Option<&str> {
        match self {
            KeyRequest::None => None,
            KeyRequest::Column(name) => Some(name),
        }
    }
}

/// A live database connection
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite")
    fn driver_name(&self) -> &str;

    /// Prepare a parameterized statement
    ///
    /// The returned statement borrows the connection and must be dropped
    /// before the connection goes back to its provider.
    fn prepare(&self, sql: &str, keys: KeyRequest<'_>) -> DriverResult<Box<dyn Statement + '_>>;

    /// Close the connection
    fn close(&self) -> DriverResult<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A prepared statement with positional `?` placeholders
pub trait Statement {
    /// Bind `value` to the placeholder at 1-based `index`
    fn bind(&mut self, index: usize, value: &Value) -> DriverResult<()>;

    /// Run a data-modification statement, returning the affected row count
    fn execute_update(&mut self) -> DriverResult<u64>;

    /// Run a read statement and open a cursor over its rows
    fn execute_query(&mut self) -> DriverResult<Box<dyn RowCursor + '_>>;

    /// Cursor over the keys generated by the last `execute_update`
    ///
    /// Empty when the statement was prepared with [`KeyRequest::None`] or the
    /// database generated nothing.
    fn generated_keys(&mut self) -> DriverResult<Box<dyn RowCursor + '_>>;
}

/// A forward-only cursor over fetched rows
pub trait RowCursor {
    /// Advance to the next row, returning `None` once the cursor is exhausted
    fn next_row(&mut self) -> DriverResult<Option<&Row>>;
}

/// Cursor over rows that were already fetched into memory
#[derive(Debug, Default)]
pub struct MaterializedCursor {
    pending: VecDeque<Row>,
    current: Option<Row>,
}

impl MaterializedCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            pending: rows.into(),
            current: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Rows not yet handed out
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl RowCursor for MaterializedCursor {
    fn next_row(&mut self) -> DriverResult<Option<&Row>> {
        self.current = self.pending.pop_front();
        Ok(self.current.as_ref())
    }
}

/// Source of connections scoped to one unit of work
///
/// Every successful [`acquire`](ConnectionProvider::acquire) is paired with
/// exactly one [`release`](ConnectionProvider::release) of the same
/// connection.
pub trait ConnectionProvider: Send + Sync {
    /// Hand out a connection bound to the current unit of work
    fn acquire(&self) -> Result<Arc<dyn Connection>>;

    /// Take back a connection obtained from `acquire`
    fn release(&self, connection: Arc<dyn Connection>) -> Result<()>;
}

impl<T: ConnectionProvider + ?Sized> ConnectionProvider for Arc<T> {
    fn acquire(&self) -> Result<Arc<dyn Connection>> {
        (**self).acquire()
    }

    fn release(&self, connection: Arc<dyn Connection>) -> Result<()> {
        (**self).release(connection)
    }
}
