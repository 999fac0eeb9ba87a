//! [`SqliteProvider`] and [`SqliteSession`]: the SQLite implementations of
//! [`ConnectionProvider`] and [`Session`].

use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use sazonal_core::{
  catalog::TableDef,
  record::Value,
  session::{ConnectionProvider, InsertCounts, Session},
};

use crate::{
  Error, Result,
  config::{MEMORY, SqliteConfig},
  encode::{encode_value, is_row_violation},
  schema::{DATABASE_LIST, PRAGMAS, attach_statement, insert_statement},
};

// ─── Provider ────────────────────────────────────────────────────────────────

/// Opens [`SqliteSession`]s from one immutable [`SqliteConfig`].
#[derive(Debug, Clone)]
pub struct SqliteProvider {
  config: SqliteConfig,
}

impl SqliteProvider {
  pub fn new(config: SqliteConfig) -> Self { Self { config } }
}

impl ConnectionProvider for SqliteProvider {
  type Session = SqliteSession;

  fn connect(&self) -> Result<SqliteSession> { SqliteSession::open(&self.config) }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One SQLite connection plus the database currently selected on it.
pub struct SqliteSession {
  pub(crate) conn: Connection,
  config:          SqliteConfig,
  database:        Option<String>,
}

impl SqliteSession {
  /// Open the configured database, enable foreign keys and check the
  /// connection answers. One attempt.
  pub fn open(config: &SqliteConfig) -> Result<Self> {
    let open = || -> rusqlite::Result<Connection> {
      let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
      } else {
        Connection::open(&config.path)?
      };
      conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
      conn.execute_batch(PRAGMAS)?;
      conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
      Ok(conn)
    };

    let conn = open().map_err(|source| Error::Open {
      path: config.path.display().to_string(),
      source,
    })?;

    info!(path = %config.path.display(), "database session opened");
    Ok(Self { conn, config: config.clone(), database: None })
  }

  /// The database inserts currently target.
  pub fn database(&self) -> Option<&str> { self.database.as_deref() }

  fn is_attached(&self, database: &str) -> Result<bool> {
    let mut stmt = self.conn.prepare(DATABASE_LIST)?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|n| n == database))
  }

  /// Attach `database`, creating its file if absent. A no-op when it is
  /// already attached.
  fn attach(&mut self, database: &str) -> Result<()> {
    if self.is_attached(database)? {
      debug!(database, "database already attached");
      return Ok(());
    }

    let location = self
      .config
      .database_file(database)
      .map(|p| p.to_string_lossy().into_owned())
      .unwrap_or_else(|| MEMORY.to_owned());

    self
      .conn
      .execute(&attach_statement(database), [&location])
      .map_err(|source| Error::Ddl { object: format!("database {database}"), source })?;

    info!(database, %location, "database attached");
    Ok(())
  }
}

impl Session for SqliteSession {
  type Error = Error;

  fn initialize_schema(&mut self, database: &str, tables: &[&'static TableDef]) -> Result<()> {
    // ATTACH cannot run inside a transaction, so it precedes the table unit.
    self.attach(database)?;
    self.database = Some(database.to_owned());

    let tx = self.conn.transaction()?;
    for table in tables {
      debug!(table = table.name, "creating table if absent");
      tx.execute_batch(&table.create_statement(Some(database)))
        .map_err(|source| Error::Ddl { object: format!("table {}", table.name), source })?;
    }
    tx.commit()?;

    Ok(())
  }

  fn use_database(&mut self, database: &str) -> Result<()> {
    if !self.is_attached(database)? {
      return Err(Error::NotAttached(database.to_owned()));
    }
    self.database = Some(database.to_owned());
    debug!(database, "database selected");
    Ok(())
  }

  fn insert_ignore(
    &mut self,
    table: &'static TableDef,
    rows: &[Vec<Value>],
  ) -> Result<InsertCounts> {
    let database = self.database.as_deref().ok_or(Error::NoDatabase)?;
    let sql = insert_statement(database, table);

    let expected = table.columns.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
      return Err(Error::Arity { table: table.name, row: i + 1, expected, found: row.len() });
    }

    // Dropping `tx` without commit rolls the whole batch back.
    let tx = self.conn.transaction()?;
    let mut counts = InsertCounts::default();
    {
      let mut stmt = tx.prepare(&sql)?;
      for (i, row) in rows.iter().enumerate() {
        match stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_value))) {
          Ok(0) => counts.ignored += 1,
          Ok(_) => counts.inserted += 1,
          Err(e) if is_row_violation(&e) => {
            debug!(table = table.name, row = i + 1, error = %e, "row rejected");
            counts.rejected += 1;
          }
          Err(e) => return Err(e.into()),
        }
      }
    }
    tx.commit()?;

    Ok(counts)
  }

  fn close(self) -> Result<()> {
    self.conn.close().map_err(|(_, e)| Error::Database(e))
  }
}
