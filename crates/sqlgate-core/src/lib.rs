//! SQLGATE Core - Core abstractions for statement execution
//!
//! This crate provides the types and traits shared by the statement executor
//! and the database drivers. It defines:
//!
//! - `Connection`, `Statement`, `RowCursor` - Traits implemented by drivers
//! - `ConnectionProvider` - Source of connections scoped to one unit of work
//! - `RowMapper` - Capability that turns a positional row into a typed value
//! - `KeyCollector` - Accumulator for database-generated keys
//! - Common types like `Value`, `Row` and the error taxonomy

mod config;
mod connection;
mod error;
mod keys;
mod mapper;
mod types;

#[cfg(test)]
mod tests;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use keys::*;
pub use mapper::*;
pub use types::*;
