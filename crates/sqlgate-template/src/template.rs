//! Statement executor

use std::fmt;
use std::sync::Arc;

use sqlgate_core::{
    ConnectionProvider, DriverResult, FromValue, KeyCollector, KeyRequest, Result,
    RowMapper, SqlGateError, Statement, Value,
};

use crate::scope::ScopedConnection;

/// Callback invoked with the SQL text of every statement before it runs
pub type StatementHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Executes parameterized SQL against connections from a [`ConnectionProvider`]
///
/// Every operation checks out one connection, prepares the statement, binds
/// the parameters positionally (1..=n), runs it and releases the connection
/// before returning. Driver failures come back as
/// [`SqlGateError::Execution`] with the original cause attached; provider
/// failures are returned untouched. Nothing is retried.
///
/// # Example
///
/// ```ignore
/// use sqlgate_core::{params, Row};
/// use sqlgate_template::SqlTemplate;
///
/// let template = SqlTemplate::new(provider);
/// let ids = template.execute_update_returning_keys::<i64>(
///     "insert into users (account) values (?)",
///     "id",
///     &params!["alice"],
/// )?;
/// let account = template.query_for_object(
///     "select account from users where id = ?",
///     &|row: &Row| row.get::<String>(1),
///     &params![ids[0]],
/// )?;
/// ```
#[derive(Clone)]
pub struct SqlTemplate {
    provider: Arc<dyn ConnectionProvider>,
    hook: Option<StatementHook>,
}

impl fmt::Debug for SqlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlTemplate")
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl SqlTemplate {
    /// Create an executor on top of `provider`
    pub fn new<P: ConnectionProvider + 'static>(provider: P) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    /// Create an executor sharing an already reference-counted provider
    pub fn from_shared(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            hook: None,
        }
    }

    /// Install a hook that sees the SQL text of every statement
    pub fn with_statement_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Run a data-modification statement, returning the affected row count
    #[tracing::instrument(skip_all, fields(sql_preview = %preview(sql), params = params.len()))]
    pub fn execute_update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.run(sql, KeyRequest::None, params, |statement| {
            statement.execute_update()
        })
    }

    /// Run an insert-style statement and feed its generated keys to `collector`
    ///
    /// Keys are read from the first column of the generated-keys cursor and
    /// appended in the order the database reports them. The collector is only
    /// touched when the whole statement succeeds.
    #[tracing::instrument(skip_all, fields(sql_preview = %preview(sql), key_column = collector.column_name()))]
    pub fn execute_with_keys<K: FromValue>(
        &self,
        sql: &str,
        collector: &mut KeyCollector<K>,
        params: &[Value],
    ) -> Result<u64> {
        let column = collector.column_name().to_string();
        let (affected, keys) = self.run(sql, KeyRequest::Column(&column), params, |statement| {
            let affected = statement.execute_update()?;
            let mut keys = Vec::new();
            let mut cursor = statement.generated_keys()?;
            while let Some(row) = cursor.next_row()? {
                keys.push(row.get::<K>(1)?);
            }
            Ok((affected, keys))
        })?;

        tracing::debug!(affected_rows = affected, keys = keys.len(), "generated keys collected");
        for key in keys {
            collector.add_key(key);
        }
        Ok(affected)
    }

    /// Run an insert-style statement and return the keys generated for `key_column`
    ///
    /// An empty vector means the database generated no keys; that is not an
    /// error.
    pub fn execute_update_returning_keys<K: FromValue>(
        &self,
        sql: &str,
        key_column: &str,
        params: &[Value],
    ) -> Result<Vec<K>> {
        let mut collector = KeyCollector::new(key_column);
        self.execute_with_keys(sql, &mut collector, params)?;
        Ok(collector.into_keys())
    }

    /// Run a query and map every row, in cursor order
    #[tracing::instrument(skip_all, fields(sql_preview = %preview(sql), params = params.len()))]
    pub fn query_for_list<T, M>(&self, sql: &str, mapper: &M, params: &[Value]) -> Result<Vec<T>>
    where
        M: RowMapper<T> + ?Sized,
    {
        let rows = self.run(sql, KeyRequest::None, params, |statement| {
            let mut cursor = statement.execute_query()?;
            let mut mapped = Vec::new();
            while let Some(row) = cursor.next_row()? {
                mapped.push(mapper.map_row(row)?);
            }
            Ok(mapped)
        })?;

        tracing::debug!(row_count = rows.len(), "query mapped");
        Ok(rows)
    }

    /// Run a query expected to match at most one row
    ///
    /// Returns `Ok(None)` when nothing matches. When more than one row
    /// matches, the cursor is still drained and the call fails with
    /// [`SqlGateError::Integrity`].
    #[tracing::instrument(skip_all, fields(sql_preview = %preview(sql), params = params.len()))]
    pub fn query_for_object<T, M>(
        &self,
        sql: &str,
        mapper: &M,
        params: &[Value],
    ) -> Result<Option<T>>
    where
        M: RowMapper<T> + ?Sized,
    {
        let (first, total) = self.run(sql, KeyRequest::None, params, |statement| {
            let mut cursor = statement.execute_query()?;
            let first = match cursor.next_row()? {
                Some(row) => Some(mapper.map_row(row)?),
                None => None,
            };
            let mut total = usize::from(first.is_some());
            while cursor.next_row()?.is_some() {
                total += 1;
            }
            Ok((first, total))
        })?;

        match total {
            0 => {
                tracing::debug!("no row matched");
                Ok(None)
            }
            1 => Ok(first),
            n => {
                tracing::error!(row_count = n, "single-row query matched several rows");
                Err(SqlGateError::Integrity(format!(
                    "expected at most one row, query returned {}",
                    n
                )))
            }
        }
    }

    /// Acquire, prepare, bind, run `work`, translate failures, release
    fn run<R>(
        &self,
        sql: &str,
        keys: KeyRequest<'_>,
        params: &[Value],
        work: impl FnOnce(&mut dyn Statement) -> DriverResult<R>,
    ) -> Result<R> {
        let connection = ScopedConnection::acquire(self.provider.as_ref())?;

        if let Some(hook) = &self.hook {
            hook(sql);
        }
        tracing::debug!(sql = %sql, driver = connection.driver_name(), "executing statement");

        let outcome = (|| -> DriverResult<R> {
            let mut statement = connection.prepare(sql, keys)?;
            bind_params(statement.as_mut(), params)?;
            work(statement.as_mut())
        })();

        outcome.map_err(|e| {
            tracing::error!(error = %e, sql = %sql, "statement failed");
            SqlGateError::execution(sql, e)
        })
    }
}

/// Bind every parameter at its 1-based position, in list order
fn bind_params(statement: &mut dyn Statement, params: &[Value]) -> DriverResult<()> {
    for (offset, value) in params.iter().enumerate() {
        statement.bind(offset + 1, value)?;
    }
    Ok(())
}

fn preview(sql: &str) -> String {
    sql.chars().take(100).collect()
}
