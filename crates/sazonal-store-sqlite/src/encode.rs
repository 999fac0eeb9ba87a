//! Conversions between core values and rusqlite's types.

use rusqlite::{
  ErrorCode,
  types::{ToSqlOutput, ValueRef},
};
use sazonal_core::record::Value;

pub fn encode_value(value: &Value) -> ToSqlOutput<'_> {
  match value {
    Value::Int(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
    Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
  }
}

/// Whether `err` is a per-row constraint failure (foreign key, check, not
/// null) that the insert policy skips rather than aborting the batch.
pub fn is_row_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
  )
}
