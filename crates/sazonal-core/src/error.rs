//! Error types for `sazonal-core`.
//!
//! [`Error`] is the taxonomy the pipeline reports: each variant names the
//! kind of failure and the table or database it happened on. Backend errors
//! cross the [`Session`](crate::session::Session) seam boxed.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// No session could be established. Fatal to the run.
  #[error("connection failed: {0}")]
  Connection(#[source] BoxError),

  #[error("schema initialisation of {database} failed: {source}")]
  Schema {
    database: &'static str,
    #[source]
    source:   BoxError,
  },

  #[error("cannot select database {database}: {source}")]
  Select {
    database: &'static str,
    #[source]
    source:   BoxError,
  },

  #[error("cannot read source data for {table}: {source}")]
  Source {
    table:  &'static str,
    #[source]
    source: BoxError,
  },

  #[error(transparent)]
  Mapping(#[from] MappingError),

  #[error("load into {table} failed: {source}")]
  Load {
    table:  &'static str,
    #[source]
    source: BoxError,
  },

  #[error(transparent)]
  Catalog(#[from] CatalogError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
  #[error("{table} expects columns {expected:?}, got {found:?}")]
  ColumnMismatch {
    table:    &'static str,
    expected: Vec<&'static str>,
    found:    Vec<String>,
  },

  #[error("{table} has no column {column}")]
  UnknownColumn {
    table:  &'static str,
    column: &'static str,
  },

  #[error("{table} references {references}, which is not created before it")]
  ForwardReference {
    table:      &'static str,
    references: &'static str,
  },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
  #[error("column {0:?} appears more than once")]
  DuplicateColumn(String),

  #[error("row {row} has {found} fields, expected {expected}")]
  RaggedRow {
    row:      usize,
    expected: usize,
    found:    usize,
  },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
  #[error("{table}: rename target {target:?} is not a column of the table")]
  UnknownTarget { table: &'static str, target: String },

  #[error("{table}: more than one rule renames to {target:?}")]
  DuplicateTarget { table: &'static str, target: String },

  #[error("{table}: more than one rule renames {source_column:?}")]
  DuplicateSource {
    table:         &'static str,
    source_column: String,
  },

  #[error("{table}: source columns {first:?} and {second:?} both map to {target}")]
  Ambiguous {
    table:  &'static str,
    target: &'static str,
    first:  String,
    second: String,
  },

  #[error("{table}: no source column provides {column}")]
  MissingColumn {
    table:  &'static str,
    column: &'static str,
  },
}

/// A field of one source row that cannot be stored. Only that row is
/// skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
  #[error("row {row}: {column} is empty")]
  Missing { row: usize, column: &'static str },

  #[error("row {row}: {column} = {value:?} is not {expected}")]
  Invalid {
    row:      usize,
    column:   &'static str,
    value:    String,
    expected: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
