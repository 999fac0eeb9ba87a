//! What a run reports back: one outcome per table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::Error, session::InsertCounts};

/// Result of loading one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  pub table:     &'static str,
  pub attempted: usize,
  #[serde(flatten)]
  pub counts:    InsertCounts,
}

impl LoadReport {
  pub fn inserted(&self) -> usize { self.counts.inserted }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TableOutcome {
  Loaded(LoadReport),
  Failed { table: &'static str, error: String },
}

impl TableOutcome {
  pub(crate) fn failed(table: &'static str, error: &Error) -> Self {
    TableOutcome::Failed { table, error: error.to_string() }
  }

  pub fn table(&self) -> &'static str {
    match self {
      TableOutcome::Loaded(r) => r.table,
      TableOutcome::Failed { table, .. } => table,
    }
  }

  pub fn report(&self) -> Option<&LoadReport> {
    match self {
      TableOutcome::Loaded(r) => Some(r),
      TableOutcome::Failed { .. } => None,
    }
  }

  pub fn is_failed(&self) -> bool { matches!(self, TableOutcome::Failed { .. }) }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id:      Uuid,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  /// `false` when schema initialisation failed and the run was allowed to
  /// continue anyway.
  pub schema_ok:   bool,
  pub tables:      Vec<TableOutcome>,
}

impl RunReport {
  pub fn table(&self, name: &str) -> Option<&TableOutcome> {
    self.tables.iter().find(|t| t.table() == name)
  }

  pub fn has_failures(&self) -> bool {
    !self.schema_ok || self.tables.iter().any(TableOutcome::is_failed)
  }
}
