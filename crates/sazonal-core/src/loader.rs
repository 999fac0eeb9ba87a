//! The idempotent bulk load of one table.

use tracing::{debug, info, warn};

use crate::{
  dataset::Dataset,
  error::{Error, Result},
  record::{Record, records},
  report::LoadReport,
  session::{InsertCounts, Session},
};

/// Insert `rows` into `R::TABLE` with conflict-ignore semantics.
///
/// The report counts rows actually inserted, so loading the same rows a
/// second time reports zero. A backend failure comes back as
/// [`Error::Load`] after the session has rolled the batch back.
pub fn load<S, R>(session: &mut S, rows: &[R]) -> Result<LoadReport>
where
  S: Session,
  R: Record,
{
  insert(session, rows, 0)
}

/// Type a mapped dataset and load it into `R::TABLE`.
///
/// Rows with an empty or malformed field are skipped and counted as
/// rejected, like rows the database refuses. A header that does not match
/// the table fails the whole load.
pub fn load_dataset<S, R>(session: &mut S, dataset: &Dataset) -> Result<LoadReport>
where
  S: Session,
  R: Record,
{
  let typed = records::<R>(dataset)?;
  for e in &typed.invalid {
    warn!(table = R::TABLE.name, error = %e, "row skipped");
  }

  insert(session, &typed.rows, typed.invalid.len())
}

fn insert<S, R>(session: &mut S, rows: &[R], invalid: usize) -> Result<LoadReport>
where
  S: Session,
  R: Record,
{
  let table = R::TABLE;
  let values: Vec<_> = rows.iter().map(Record::values).collect();

  let mut counts = if values.is_empty() {
    debug!(table = table.name, "nothing to insert");
    InsertCounts::default()
  } else {
    session
      .insert_ignore(table, &values)
      .map_err(|e| Error::Load { table: table.name, source: Box::new(e) })?
  };
  counts.rejected += invalid;
  let attempted = rows.len() + invalid;

  info!(
    table = table.name,
    attempted,
    inserted = counts.inserted,
    ignored = counts.ignored,
    rejected = counts.rejected,
    "table loaded"
  );

  Ok(LoadReport { table: table.name, attempted, counts })
}
