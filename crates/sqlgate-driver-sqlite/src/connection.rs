//! SQLite connection implementation

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use sqlgate_core::{
    Connection, DriverError, DriverErrorKind, DriverResult, KeyRequest, MaterializedCursor, Result,
    Row, RowCursor, SqlGateError, Statement, Value,
};

use crate::SqliteConfig;

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Mutex<Option<RusqliteConnection>>,
    path: String,
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database and apply the configured pragmas
    #[tracing::instrument(skip(config), fields(path = %config.path))]
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let expanded_path = Self::expand_path(&config.path)?;

        let conn = if config.is_memory() {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlGateError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:")
                && let Some(parent) = std::path::Path::new(&expanded_path).parent()
                && !parent.exists()
            {
                return Err(SqlGateError::Connection(format!(
                    "Parent directory does not exist: {}",
                    parent.display()
                )));
            }

            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                SqlGateError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
        conn.pragma_update(None, "foreign_keys", foreign_keys)
            .map_err(|e| SqlGateError::Connection(format!("Failed to set foreign keys: {}", e)))?;

        if !config.is_memory() {
            conn.pragma_update(None, "journal_mode", &config.journal_mode)
                .map_err(|e| SqlGateError::Connection(format!("Failed to set journal mode: {}", e)))?;
        }

        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| SqlGateError::Connection(format!("Failed to set busy timeout: {}", e)))?;

        tracing::debug!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: expanded_path,
            closed: AtomicBool::new(false),
        })
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == crate::config::MEMORY_PATH || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            match std::env::var_os("HOME") {
                Some(home) => std::path::PathBuf::from(home)
                    .join(rest)
                    .to_string_lossy()
                    .to_string(),
                None => {
                    return Err(SqlGateError::Configuration(
                        "Unable to determine HOME directory".into(),
                    ));
                }
            }
        } else if path.starts_with('~') {
            return Err(SqlGateError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }

    /// Run `f` against the open handle, failing once the connection is closed
    fn with_conn<R>(
        &self,
        f: impl FnOnce(&RusqliteConnection) -> DriverResult<R>,
    ) -> DriverResult<R> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| DriverError::new(DriverErrorKind::Closed, "connection is closed"))?;
        f(conn)
    }
}

impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, keys), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn prepare(&self, sql: &str, keys: KeyRequest<'_>) -> DriverResult<Box<dyn Statement + '_>> {
        // Compile up front so syntax errors surface before binding
        let (text, parameter_count, key_index) = self.with_conn(|conn| {
            let stmt = conn
                .prepare_cached(sql)
                .map_err(|e| driver_error(DriverErrorKind::Prepare, "Failed to prepare statement", e))?;
            let parameter_count = stmt.parameter_count();

            let Some(column) = keys.column() else {
                return Ok((sql.to_string(), parameter_count, None));
            };

            // Statement already yields rows (explicit RETURNING): take the key column from them
            if stmt.column_count() > 0 {
                let index = stmt.column_index(column).map_err(|e| {
                    driver_error(
                        DriverErrorKind::Prepare,
                        &format!("Key column '{}' is not returned by the statement", column),
                        e,
                    )
                })?;
                return Ok((sql.to_string(), parameter_count, Some(index)));
            }

            if stmt.readonly() || !is_insert(sql) {
                return Ok((sql.to_string(), parameter_count, None));
            }
            drop(stmt);

            let text = with_returning(sql, column);
            let stmt = conn.prepare_cached(&text).map_err(|e| {
                driver_error(DriverErrorKind::Prepare, "Failed to request generated keys", e)
            })?;
            let parameter_count = stmt.parameter_count();
            Ok((text, parameter_count, Some(0)))
        })?;

        Ok(Box::new(SqliteStatement {
            conn: self,
            sql: text,
            params: vec![None; parameter_count],
            key_index,
            keys: Vec::new(),
        }))
    }

    fn close(&self) -> DriverResult<()> {
        let taken = self.conn.lock().take();
        self.closed.store(true, Ordering::SeqCst);
        match taken {
            Some(conn) => {
                conn.close().map_err(|(_, e)| {
                    driver_error(DriverErrorKind::Closed, "Failed to close connection", e)
                })?;
                tracing::debug!(path = %self.path, "SQLite connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A statement prepared on a [`SqliteConnection`]
///
/// Bound values are kept until execution; the compiled statement itself
/// lives in the connection's statement cache.
pub struct SqliteStatement<'c> {
    conn: &'c SqliteConnection,
    sql: String,
    params: Vec<Option<rusqlite::types::Value>>,
    /// Position of the generated-key column in the rows the statement yields
    key_index: Option<usize>,
    keys: Vec<Row>,
}

impl SqliteStatement<'_> {
    fn bound_values(&self) -> DriverResult<Vec<rusqlite::types::Value>> {
        self.params
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                value
                    .clone()
                    .ok_or_else(|| DriverError::bind(format!("no value bound for parameter {}", idx + 1)))
            })
            .collect()
    }
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, index: usize, value: &Value) -> DriverResult<()> {
        let count = self.params.len();
        let slot = index
            .checked_sub(1)
            .and_then(|idx| self.params.get_mut(idx))
            .ok_or_else(|| {
                DriverError::bind(format!(
                    "parameter index {} out of range (statement has {} placeholders)",
                    index, count
                ))
            })?;
        *slot = Some(value_to_sqlite(value));
        Ok(())
    }

    fn execute_update(&mut self) -> DriverResult<u64> {
        let values = self.bound_values()?;
        let sql = &self.sql;

        let Some(key_index) = self.key_index else {
            let affected = self.conn.with_conn(|conn| {
                let mut stmt = conn
                    .prepare_cached(sql)
                    .map_err(|e| driver_error(DriverErrorKind::Prepare, "Failed to prepare statement", e))?;
                stmt.execute(params_from_iter(values.iter()))
                    .map_err(|e| driver_error(DriverErrorKind::Execute, "Failed to execute statement", e))
            })?;
            tracing::debug!(affected_rows = affected, "statement executed");
            return Ok(affected as u64);
        };

        let (affected, keys) = self.conn.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(sql)
                .map_err(|e| driver_error(DriverErrorKind::Prepare, "Failed to prepare statement", e))?;
            let mut rows = stmt
                .query(params_from_iter(values.iter()))
                .map_err(|e| driver_error(DriverErrorKind::Execute, "Failed to execute statement", e))?;

            let mut keys = Vec::new();
            while let Some(row) = rows
                .next()
                .map_err(|e| driver_error(DriverErrorKind::Execute, "Failed to execute statement", e))?
            {
                keys.push(Row::new(vec![sqlite_to_value(row, key_index)?]));
            }
            Ok((conn.changes() as u64, keys))
        })?;

        tracing::debug!(affected_rows = affected, keys = keys.len(), "statement executed");
        self.keys = keys;
        Ok(affected)
    }

    fn execute_query(&mut self) -> DriverResult<Box<dyn RowCursor + '_>> {
        let start_time = std::time::Instant::now();
        let values = self.bound_values()?;
        let sql = &self.sql;

        let rows = self.conn.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(sql)
                .map_err(|e| driver_error(DriverErrorKind::Prepare, "Failed to prepare query", e))?;
            let column_count = stmt.column_count();

            let mut query_rows = stmt
                .query(params_from_iter(values.iter()))
                .map_err(|e| driver_error(DriverErrorKind::Execute, "Failed to execute query", e))?;

            let mut rows = Vec::new();
            while let Some(row) = query_rows
                .next()
                .map_err(|e| driver_error(DriverErrorKind::Fetch, "Failed to fetch row", e))?
            {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(sqlite_to_value(row, i)?);
                }
                rows.push(Row::new(values));
            }
            Ok(rows)
        })?;

        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "query executed successfully"
        );
        Ok(Box::new(MaterializedCursor::new(rows)))
    }

    fn generated_keys(&mut self) -> DriverResult<Box<dyn RowCursor + '_>> {
        Ok(Box::new(MaterializedCursor::new(std::mem::take(&mut self.keys))))
    }
}

fn driver_error(kind: DriverErrorKind, context: &str, err: rusqlite::Error) -> DriverError {
    let message = format!("{}: {}", context, err);
    DriverError::with_source(kind, message, err)
}

/// Leading keyword check, after any whitespace and comments
fn is_insert(sql: &str) -> bool {
    let head: String = skip_leading_comments(sql)
        .chars()
        .take(7)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("insert") || head.starts_with("replace")
}

fn skip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(line) = rest.strip_prefix("--") {
            rest = line.find('\n').map_or("", |end| &line[end + 1..]).trim_start();
        } else if let Some(block) = rest.strip_prefix("/*") {
            rest = block.find("*/").map_or("", |end| &block[end + 2..]).trim_start();
        } else {
            return rest;
        }
    }
}

fn with_returning(sql: &str, column: &str) -> String {
    let body = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{} RETURNING \"{}\"", body, column.replace('"', "\"\""))
}

fn value_to_sqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Uuid(u) => rusqlite::types::Value::Text(u.to_string()),
        Value::DateTime(dt) => rusqlite::types::Value::Text(dt.to_string()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
    }
}

/// Convert rusqlite row value to our Value type
fn sqlite_to_value(row: &rusqlite::Row, idx: usize) -> DriverResult<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| driver_error(DriverErrorKind::Fetch, "Failed to read column", e))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    };

    Ok(value)
}
