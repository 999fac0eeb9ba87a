//! SQLite statements built around the catalog.
//!
//! Table DDL itself is rendered by [`TableDef::create_statement`]; this
//! module only adds what is specific to SQLite.

use sazonal_core::catalog::TableDef;

/// Applied to every new connection. Foreign keys are off by default in
/// SQLite and must be enabled per connection.
pub const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Names of the databases attached to the connection.
pub const DATABASE_LIST: &str = "SELECT name FROM pragma_database_list";

/// `CREATE DATABASE IF NOT EXISTS` for SQLite: attach the file at `?1`,
/// creating it if needed.
pub fn attach_statement(database: &str) -> String {
  format!("ATTACH DATABASE ?1 AS {database}")
}

/// One-row parameterized insert with the "ignore" conflict policy.
pub fn insert_statement(database: &str, table: &TableDef) -> String {
  let columns = table.column_names();
  let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
    table.qualified_name(Some(database)),
    columns.join(", "),
    placeholders.join(", ")
  )
}
