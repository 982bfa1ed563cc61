//! Error types for SQLGATE

use std::fmt;

use thiserror::Error;

/// Boxed low-level cause carried by a [`DriverError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of statement handling at which a driver failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverErrorKind {
    /// Statement preparation (syntax errors, unknown tables)
    Prepare,
    /// Parameter binding
    Bind,
    /// Statement execution
    Execute,
    /// Advancing a result or generated-keys cursor
    Fetch,
    /// Converting a column value while mapping a row
    Mapping,
    /// The connection was already closed
    Closed,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverErrorKind::Prepare => "prepare",
            DriverErrorKind::Bind => "bind",
            DriverErrorKind::Execute => "execute",
            DriverErrorKind::Fetch => "fetch",
            DriverErrorKind::Mapping => "mapping",
            DriverErrorKind::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Low-level failure reported by a driver, a cursor or a row mapper
#[derive(Error, Debug)]
#[error("{kind} failed: {message}")]
pub struct DriverError {
    kind: DriverErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl DriverError {
    /// Create a driver error without an underlying cause
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a driver error wrapping the native error that caused it
    pub fn with_source(
        kind: DriverErrorKind,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn prepare(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Prepare, message)
    }

    pub fn bind(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Bind, message)
    }

    pub fn execute(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Execute, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Fetch, message)
    }

    pub fn mapping(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Mapping, message)
    }

    pub fn kind(&self) -> DriverErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The native driver error, if one was captured
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

/// Core error type for SQLGATE operations
#[derive(Error, Debug)]
pub enum SqlGateError {
    /// Preparing, binding, executing, traversing or mapping a statement failed
    #[error("Execution error for `{sql}`: {source}")]
    Execution {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// A single-row query matched more than one row
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// The connection provider could not hand out or take back a connection
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SqlGateError {
    /// Wrap a driver failure raised while running `sql`
    pub fn execution(sql: &str, source: DriverError) -> Self {
        SqlGateError::Execution {
            sql: sql.to_string(),
            source,
        }
    }

    /// The driver failure behind an execution error
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            SqlGateError::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for SQLGATE operations
pub type Result<T> = std::result::Result<T, SqlGateError>;

/// Result type alias for driver-level operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;
