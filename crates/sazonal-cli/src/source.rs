//! [`CsvSource`]: datasets read from CSV files with a header row.

use std::{io, path::PathBuf};

use sazonal_core::{
  catalog::TableDef, dataset::Dataset, error::DatasetError, pipeline::DatasetSource,
};
use thiserror::Error;
use tracing::debug;

use crate::settings::SourcePaths;

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("cannot read {path}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("{path}: {source}")]
  Shape {
    path:   PathBuf,
    #[source]
    source: DatasetError,
  },
}

/// Failure reading CSV text, before a file path is attached to it.
#[derive(Debug, Error)]
pub enum ReadError {
  #[error(transparent)]
  Csv(#[from] csv::Error),

  #[error(transparent)]
  Shape(#[from] DatasetError),
}

pub struct CsvSource {
  paths: SourcePaths,
}

impl CsvSource {
  pub fn new(paths: SourcePaths) -> Self { Self { paths } }
}

impl DatasetSource for CsvSource {
  type Error = SourceError;

  fn fetch(&self, table: &'static TableDef) -> Result<Dataset, SourceError> {
    let path = self.paths.for_table(table).to_path_buf();

    debug!(table = table.name, path = %path.display(), "reading csv");
    let file = std::fs::File::open(&path)
      .map_err(|e| SourceError::Csv { path: path.clone(), source: e.into() })?;

    read_csv(file).map_err(|e| match e {
      ReadError::Csv(source) => SourceError::Csv { path, source },
      ReadError::Shape(source) => SourceError::Shape { path, source },
    })
  }
}

/// Parse CSV text with a header row into a [`Dataset`]. Fields are trimmed.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Dataset, ReadError> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);

  let columns = rdr.headers()?.iter().map(str::to_owned).collect();
  let rows = rdr
    .records()
    .map(|record| record.map(|r| r.iter().map(str::to_owned).collect()))
    .collect::<Result<Vec<Vec<String>>, _>>()?;

  Ok(Dataset::new(columns, rows)?)
}
