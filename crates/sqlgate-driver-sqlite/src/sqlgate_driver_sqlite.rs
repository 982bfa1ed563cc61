//! SQLite database driver implementation

mod config;
mod connection;
mod provider;

pub use config::SqliteConfig;
pub use connection::{SqliteConnection, SqliteStatement};
pub use provider::SqliteConnectionProvider;
