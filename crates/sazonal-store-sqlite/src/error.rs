//! Error type for `sazonal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open database at {path}: {source}")]
  Open {
    path:   String,
    #[source]
    source: rusqlite::Error,
  },

  /// A schema object could not be created; the enclosing transaction was
  /// rolled back.
  #[error("failed to create {object}: {source}")]
  Ddl {
    object: String,
    #[source]
    source: rusqlite::Error,
  },

  #[error("database {0} is not attached to this session")]
  NotAttached(String),

  #[error("no database selected")]
  NoDatabase,

  #[error("row {row} of {table} has {found} values, expected {expected}")]
  Arity {
    table:    &'static str,
    row:      usize,
    expected: usize,
    found:    usize,
  },

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
