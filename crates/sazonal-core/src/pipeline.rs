//! The load orchestrator.
//!
//! One run is a fixed sequence: connect, initialise the schema, select the
//! database, load `dim_tempo_mes`, `dim_produto`, then `fato_sazonalidade`,
//! and release the connection. The fact table goes last because its rows
//! reference both dimensions. Nothing is retried.

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::{
  catalog::{
    DATABASE_NAME, PRODUCT_DIMENSION, SEASONALITY_FACT, TABLES, TIME_DIMENSION, TableDef,
    check_order,
  },
  dataset::Dataset,
  error::{Error, Result},
  loader::load_dataset,
  mapping::ColumnMapping,
  record::{FactRow, ProductRow, Record, TimeRow},
  report::{LoadReport, RunReport, TableOutcome},
  session::{ConnectionProvider, Session},
};

/// Source header renames for `dim_produto`.
pub const PRODUCT_RENAMES: [(&str, &str); 2] =
  [("Categoria", "categoria"), ("Produto", "nome_produto")];

/// Source header renames for `fato_sazonalidade`.
pub const FACT_RENAMES: [(&str, &str); 1] = [("Nivel_Oferta", "nivel_oferta")];

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
  /// Keep loading after a failed schema initialisation, trusting that the
  /// tables exist from an earlier run. Off by default.
  pub continue_on_schema_failure: bool,
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Where the raw dataset for each table comes from.
pub trait DatasetSource {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(&self, table: &'static TableDef) -> Result<Dataset, Self::Error>;
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<P, D> {
  provider: P,
  source:   D,
  options:  PipelineOptions,
  time:     ColumnMapping,
  product:  ColumnMapping,
  fact:     ColumnMapping,
}

impl<P, D> Pipeline<P, D>
where
  P: ConnectionProvider,
  D: DatasetSource,
{
  /// Validate the catalog order and the rename rules, then build the
  /// pipeline. Nothing touches the database yet.
  pub fn new(provider: P, source: D, options: PipelineOptions) -> Result<Self> {
    check_order(&TABLES)?;

    Ok(Self {
      provider,
      source,
      options,
      time: ColumnMapping::identity(&TIME_DIMENSION),
      product: ColumnMapping::new(&PRODUCT_DIMENSION, PRODUCT_RENAMES)?,
      fact: ColumnMapping::new(&SEASONALITY_FACT, FACT_RENAMES)?,
    })
  }

  /// Execute one run.
  ///
  /// A connection failure, or a schema failure unless
  /// [`PipelineOptions::continue_on_schema_failure`] is set, ends the run
  /// with an error. A failing table is recorded in the report and the next
  /// table is still loaded.
  pub fn run(&self) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);
    let _guard = span.enter();
    let started_at = Utc::now();

    let mut session = self.provider.connect().map_err(|e| {
      error!(error = %e, "cannot connect");
      Error::Connection(Box::new(e))
    })?;
    info!("connected");

    let schema_ok = match session.initialize_schema(DATABASE_NAME, &TABLES) {
      Ok(()) => {
        info!(database = DATABASE_NAME, "schema ready");
        true
      }
      Err(e) => {
        let err = Error::Schema { database: DATABASE_NAME, source: Box::new(e) };
        if !self.options.continue_on_schema_failure {
          error!(error = %err, "aborting run");
          release(session);
          return Err(err);
        }
        warn!(error = %err, "continuing with existing tables");
        false
      }
    };

    if let Err(e) = session.use_database(DATABASE_NAME) {
      let err = Error::Select { database: DATABASE_NAME, source: Box::new(e) };
      error!(error = %err, "aborting run");
      release(session);
      return Err(err);
    }

    info!("starting load");
    let tables = vec![
      self.step::<TimeRow>(&mut session, &self.time),
      self.step::<ProductRow>(&mut session, &self.product),
      self.step::<FactRow>(&mut session, &self.fact),
    ];

    release(session);

    Ok(RunReport {
      run_id,
      started_at,
      finished_at: Utc::now(),
      schema_ok,
      tables,
    })
  }

  fn step<R: Record>(&self, session: &mut P::Session, mapping: &ColumnMapping) -> TableOutcome {
    let table = R::TABLE.name;
    match self.load_table::<R>(session, mapping) {
      Ok(report) => TableOutcome::Loaded(report),
      Err(e) => {
        error!(table, error = %e, "table load failed");
        TableOutcome::failed(table, &e)
      }
    }
  }

  fn load_table<R: Record>(
    &self,
    session: &mut P::Session,
    mapping: &ColumnMapping,
  ) -> Result<LoadReport> {
    let table = R::TABLE;
    debug_assert_eq!(mapping.table().name, table.name);

    let raw = self
      .source
      .fetch(table)
      .map_err(|e| Error::Source { table: table.name, source: Box::new(e) })?;
    if raw.is_empty() {
      warn!(table = table.name, "source has no rows");
    }
    let mapped = mapping.apply(&raw)?;

    load_dataset::<_, R>(session, &mapped)
  }
}

fn release<S: Session>(session: S) {
  match session.close() {
    Ok(()) => info!("connection released"),
    Err(e) => warn!(error = %e, "error while releasing connection"),
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, collections::HashMap, rc::Rc};

  use super::*;
  use crate::{record::Value, session::InsertCounts};

  #[derive(Debug, thiserror::Error)]
  #[error("{0}")]
  struct FakeError(String);

  type Log = Rc<RefCell<Vec<String>>>;

  #[derive(Default)]
  struct FakeProvider {
    log:          Log,
    fail_connect: bool,
    fail_schema:  bool,
    fail_table:   Option<&'static str>,
  }

  struct FakeSession {
    log:         Log,
    fail_schema: bool,
    fail_table:  Option<&'static str>,
  }

  impl ConnectionProvider for FakeProvider {
    type Session = FakeSession;

    fn connect(&self) -> Result<FakeSession, FakeError> {
      if self.fail_connect {
        return Err(FakeError("refused".into()));
      }
      Ok(FakeSession {
        log:         self.log.clone(),
        fail_schema: self.fail_schema,
        fail_table:  self.fail_table,
      })
    }
  }

  impl Session for FakeSession {
    type Error = FakeError;

    fn initialize_schema(
      &mut self,
      _: &str,
      tables: &[&'static TableDef],
    ) -> Result<(), FakeError> {
      let names: Vec<_> = tables.iter().map(|t| t.name).collect();
      self.log.borrow_mut().push(format!("init {}", names.join(",")));
      if self.fail_schema {
        return Err(FakeError("permission denied".into()));
      }
      Ok(())
    }

    fn use_database(&mut self, database: &str) -> Result<(), FakeError> {
      self.log.borrow_mut().push(format!("use {database}"));
      Ok(())
    }

    fn insert_ignore(
      &mut self,
      table: &'static TableDef,
      rows: &[Vec<Value>],
    ) -> Result<InsertCounts, FakeError> {
      self.log.borrow_mut().push(format!("insert {} {}", table.name, rows.len()));
      if self.fail_table == Some(table.name) {
        return Err(FakeError("connection lost".into()));
      }
      Ok(InsertCounts { inserted: rows.len(), ..Default::default() })
    }

    fn close(self) -> Result<(), FakeError> {
      self.log.borrow_mut().push("close".into());
      Ok(())
    }
  }

  #[derive(Default)]
  struct MapSource(HashMap<&'static str, Dataset>);

  impl DatasetSource for MapSource {
    type Error = FakeError;

    fn fetch(&self, table: &'static TableDef) -> Result<Dataset, FakeError> {
      self
        .0
        .get(table.name)
        .cloned()
        .ok_or_else(|| FakeError(format!("no file for {}", table.name)))
    }
  }

  fn source() -> MapSource {
    let mut map = HashMap::new();
    map.insert(
      "dim_tempo_mes",
      Dataset::from_rows(&["id_mes", "nome_mes"], [["1", "Jan"], ["2", "Fev"]]).unwrap(),
    );
    map.insert(
      "dim_produto",
      Dataset::from_rows(&["id_produto", "Categoria", "Produto"], [["10", "Fruta", "Manga"]])
        .unwrap(),
    );
    map.insert(
      "fato_sazonalidade",
      Dataset::from_rows(&["id_produto", "id_mes", "Nivel_Oferta"], [["10", "1", "A"]]).unwrap(),
    );
    MapSource(map)
  }

  fn log_of(provider: &FakeProvider) -> Vec<String> { provider.log.borrow().clone() }

  #[test]
  fn steps_run_in_dependency_order() {
    let provider = FakeProvider::default();
    let log = provider.log.clone();
    let pipeline = Pipeline::new(provider, source(), PipelineOptions::default()).unwrap();

    let report = pipeline.run().unwrap();

    assert!(report.schema_ok);
    assert!(!report.has_failures());
    assert_eq!(*log.borrow(), vec![
      "init dim_tempo_mes,dim_produto,fato_sazonalidade",
      "use db_sazonalidade_agricola",
      "insert dim_tempo_mes 2",
      "insert dim_produto 1",
      "insert fato_sazonalidade 1",
      "close",
    ]);
  }

  #[test]
  fn connection_failure_halts_before_any_step() {
    let provider = FakeProvider { fail_connect: true, ..Default::default() };
    let log = provider.log.clone();
    let pipeline = Pipeline::new(provider, source(), PipelineOptions::default()).unwrap();

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(log.borrow().is_empty());
  }

  #[test]
  fn schema_failure_is_fatal_by_default() {
    let provider = FakeProvider { fail_schema: true, ..Default::default() };
    let pipeline = Pipeline::new(provider, source(), PipelineOptions::default()).unwrap();

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, Error::Schema { database: "db_sazonalidade_agricola", .. }));
    assert_eq!(log_of(&pipeline.provider), vec![
      "init dim_tempo_mes,dim_produto,fato_sazonalidade",
      "close",
    ]);
  }

  #[test]
  fn schema_failure_can_be_tolerated() {
    let provider = FakeProvider { fail_schema: true, ..Default::default() };
    let options = PipelineOptions { continue_on_schema_failure: true };
    let pipeline = Pipeline::new(provider, source(), options).unwrap();

    let report = pipeline.run().unwrap();
    assert!(!report.schema_ok);
    assert!(report.has_failures());
    assert_eq!(report.tables.len(), 3);
    assert!(report.tables.iter().all(|t| !t.is_failed()));
  }

  #[test]
  fn failed_table_does_not_stop_later_tables() {
    let provider = FakeProvider { fail_table: Some("dim_produto"), ..Default::default() };
    let pipeline = Pipeline::new(provider, source(), PipelineOptions::default()).unwrap();

    let report = pipeline.run().unwrap();

    let product = report.table("dim_produto").unwrap();
    assert!(product.is_failed());
    let fact = report.table("fato_sazonalidade").unwrap().report().unwrap();
    assert_eq!(fact.inserted(), 1);
    assert_eq!(log_of(&pipeline.provider).last().map(String::as_str), Some("close"));
  }

  #[test]
  fn unreadable_source_is_reported_against_its_table() {
    let mut src = source();
    src.0.remove("dim_tempo_mes");
    let pipeline = Pipeline::new(FakeProvider::default(), src, PipelineOptions::default()).unwrap();

    let report = pipeline.run().unwrap();
    match report.table("dim_tempo_mes").unwrap() {
      TableOutcome::Failed { error, .. } => assert!(error.contains("no file for dim_tempo_mes")),
      other => panic!("expected failure, got {other:?}"),
    }
    assert!(!report.table("dim_produto").unwrap().is_failed());
    assert!(
      !log_of(&pipeline.provider)
        .iter()
        .any(|l| l.starts_with("insert dim_tempo_mes"))
    );
  }

  #[test]
  fn malformed_header_fails_only_that_table() {
    let mut src = source();
    src.0.insert(
      "dim_produto",
      Dataset::from_rows(&["id_produto", "Produto"], [["10", "Manga"]]).unwrap(),
    );
    let pipeline = Pipeline::new(FakeProvider::default(), src, PipelineOptions::default()).unwrap();

    let report = pipeline.run().unwrap();
    assert!(report.table("dim_produto").unwrap().is_failed());
    assert!(!report.table("dim_tempo_mes").unwrap().is_failed());
    assert!(!report.table("fato_sazonalidade").unwrap().is_failed());
  }

  #[test]
  fn bad_field_skips_only_its_row() {
    let mut src = source();
    src.0.insert(
      "dim_tempo_mes",
      Dataset::from_rows(&["id_mes", "nome_mes"], [["1", "Jan"], ["2", ""]]).unwrap(),
    );
    let pipeline = Pipeline::new(FakeProvider::default(), src, PipelineOptions::default()).unwrap();

    let report = pipeline.run().unwrap();
    let time = report.table("dim_tempo_mes").unwrap().report().unwrap();
    assert_eq!(time.attempted, 2);
    assert_eq!(time.counts, InsertCounts { inserted: 1, ignored: 0, rejected: 1 });
    assert!(log_of(&pipeline.provider).contains(&"insert dim_tempo_mes 1".to_owned()));
  }
}
