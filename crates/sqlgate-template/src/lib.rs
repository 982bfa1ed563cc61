//! SQLGATE Template - Statement execution on top of a connection provider
//!
//! [`SqlTemplate`] runs parameterized SQL with scoped connection handling:
//! each call acquires one connection, binds parameters positionally, maps
//! rows or collects generated keys, and always releases the connection.

mod scope;
mod template;


pub use template::{SqlTemplate, StatementHook};
