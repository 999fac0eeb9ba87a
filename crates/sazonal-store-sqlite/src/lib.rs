//! SQLite backend for the sazonal loader.
//!
//! The star-schema database is an attached SQLite database, so "create the
//! database if absent" and "select it" map onto `ATTACH DATABASE` and
//! schema-qualified table names.

mod config;
mod encode;
mod schema;
mod store;

pub mod error;

pub use config::SqliteConfig;
pub use error::{Error, Result};
pub use store::{SqliteProvider, SqliteSession};
