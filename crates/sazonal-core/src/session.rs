//! The `ConnectionProvider` and `Session` traits.
//!
//! Storage backends (e.g. `sazonal-store-sqlite`) implement these. The
//! pipeline depends on this abstraction, not on any concrete database.

use serde::Serialize;

use crate::{catalog::TableDef, record::Value};

/// Per-row outcome counts of one conflict-ignore insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertCounts {
  /// Rows newly persisted.
  pub inserted: usize,
  /// Rows whose key already existed; the stored row is left untouched.
  pub ignored:  usize,
  /// Rows refused by a row constraint such as a foreign key.
  pub rejected: usize,
}

/// Opens sessions against one configured database. A single attempt per
/// call; there is no retry.
pub trait ConnectionProvider {
  type Session: Session;

  fn connect(&self) -> Result<Self::Session, <Self::Session as Session>::Error>;
}

/// An open database session, exclusively owned by one caller.
///
/// Each method is one unit of work with its own transaction; a failed unit
/// is rolled back before the error is returned.
pub trait Session {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create `database` if it does not exist and select it, then create
  /// `tables` in the given order if they do not exist. The table creations
  /// commit or roll back together.
  fn initialize_schema(
    &mut self,
    database: &str,
    tables: &[&'static TableDef],
  ) -> Result<(), Self::Error>;

  /// Make `database` the target of subsequent inserts. Repeatable.
  fn use_database(&mut self, database: &str) -> Result<(), Self::Error>;

  /// Insert `rows` (each in `table`'s column order) with a per-row ignore
  /// policy: rows violating a key or row constraint are skipped and counted,
  /// any other failure rolls the whole batch back.
  fn insert_ignore(
    &mut self,
    table: &'static TableDef,
    rows: &[Vec<Value>],
  ) -> Result<InsertCounts, Self::Error>;

  /// Release the session.
  fn close(self) -> Result<(), Self::Error>;
}
