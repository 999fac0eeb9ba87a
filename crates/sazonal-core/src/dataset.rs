//! [`Dataset`]: ordered rows of raw text fields under named columns.
//!
//! This is the shape every source hands to the pipeline, before any column
//! is renamed or any field is typed.

use crate::error::DatasetError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
  columns: Vec<String>,
  rows:    Vec<Vec<String>>,
}

impl Dataset {
  /// Build a dataset, rejecting repeated column names and rows whose width
  /// differs from the header.
  pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
    for (i, name) in columns.iter().enumerate() {
      if columns[..i].contains(name) {
        return Err(DatasetError::DuplicateColumn(name.clone()));
      }
    }

    if let Some((row, found)) = rows
      .iter()
      .enumerate()
      .find(|(_, r)| r.len() != columns.len())
      .map(|(i, r)| (i + 1, r.len()))
    {
      return Err(DatasetError::RaggedRow { row, expected: columns.len(), found });
    }

    Ok(Self { columns, rows })
  }

  /// Header and rows picked by distinct indices out of a dataset that was
  /// already validated, so the shape checks of [`Dataset::new`] hold.
  pub(crate) fn from_projection(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
    Self { columns, rows }
  }

  /// Convenience constructor from borrowed literals.
  pub fn from_rows<R>(columns: &[&str], rows: R) -> Result<Self, DatasetError>
  where
    R: IntoIterator,
    R::Item: IntoIterator,
    <R::Item as IntoIterator>::Item: Into<String>,
  {
    Self::new(
      columns.iter().map(|c| (*c).to_owned()).collect(),
      rows
        .into_iter()
        .map(|r| r.into_iter().map(Into::into).collect())
        .collect(),
    )
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<String>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}
