//! Typed rows for each catalog table.
//!
//! A mapped [`Dataset`] is split here into the rows that parse and the rows
//! that do not. A row with an empty or malformed field is set aside with its
//! error; the rest of the dataset still loads.

use crate::{
  catalog::{PRODUCT_DIMENSION, SEASONALITY_FACT, TIME_DIMENSION, TableDef},
  dataset::Dataset,
  error::{CatalogError, RecordError},
};

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Int(i64),
  Text(String),
}

/// A row of a catalog table.
pub trait Record: Sized {
  const TABLE: &'static TableDef;

  /// Parse one row whose fields are in catalog column order. `row` is the
  /// 1-based position used in error messages.
  fn from_fields(row: usize, fields: &[String]) -> Result<Self, RecordError>;

  /// Parameters in catalog column order.
  fn values(&self) -> Vec<Value>;
}

/// The rows of one dataset, typed.
#[derive(Debug)]
pub struct Typed<R> {
  pub rows:    Vec<R>,
  /// One error per row that could not be typed, in dataset order.
  pub invalid: Vec<RecordError>,
}

/// Type every row of a dataset whose header is exactly `R::TABLE`'s columns.
///
/// A header mismatch fails the whole dataset. A bad field only sets its own
/// row aside.
pub fn records<R: Record>(dataset: &Dataset) -> Result<Typed<R>, CatalogError> {
  R::TABLE.check_columns(dataset.columns())?;

  let mut typed = Typed { rows: Vec::with_capacity(dataset.len()), invalid: Vec::new() };
  for (i, fields) in dataset.rows().iter().enumerate() {
    match R::from_fields(i + 1, fields) {
      Ok(row) => typed.rows.push(row),
      Err(e) => typed.invalid.push(e),
    }
  }
  Ok(typed)
}

// ─── Field parsing ───────────────────────────────────────────────────────────

struct Fields<'a> {
  table:  &'static TableDef,
  row:    usize,
  fields: &'a [String],
}

impl Fields<'_> {
  fn raw(&self, index: usize) -> Result<(&'static str, &str), RecordError> {
    let column = self.table.columns[index].name;
    let value = self.fields[index].trim();
    if value.is_empty() {
      return Err(RecordError::Missing { row: self.row, column });
    }
    Ok((column, value))
  }

  fn int(&self, index: usize) -> Result<i32, RecordError> {
    let (column, value) = self.raw(index)?;
    value.parse().map_err(|_| RecordError::Invalid {
      row: self.row,
      column,
      value: value.to_owned(),
      expected: "an integer",
    })
  }

  fn text(&self, index: usize) -> Result<String, RecordError> {
    self.raw(index).map(|(_, v)| v.to_owned())
  }

  fn code(&self, index: usize) -> Result<char, RecordError> {
    let (column, value) = self.raw(index)?;
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
      (Some(c), None) => Ok(c),
      _ => Err(RecordError::Invalid {
        row: self.row,
        column,
        value: value.to_owned(),
        expected: "a single character",
      }),
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
  pub id_mes:   i32,
  pub nome_mes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
  pub id_produto:   i32,
  pub categoria:    String,
  pub nome_produto: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRow {
  pub id_produto:   i32,
  pub id_mes:       i32,
  pub nivel_oferta: char,
}

impl Record for TimeRow {
  const TABLE: &'static TableDef = &TIME_DIMENSION;

  fn from_fields(row: usize, fields: &[String]) -> Result<Self, RecordError> {
    let f = Fields { table: Self::TABLE, row, fields };
    Ok(Self { id_mes: f.int(0)?, nome_mes: f.text(1)? })
  }

  fn values(&self) -> Vec<Value> {
    vec![Value::Int(self.id_mes.into()), Value::Text(self.nome_mes.clone())]
  }
}

impl Record for ProductRow {
  const TABLE: &'static TableDef = &PRODUCT_DIMENSION;

  fn from_fields(row: usize, fields: &[String]) -> Result<Self, RecordError> {
    let f = Fields { table: Self::TABLE, row, fields };
    Ok(Self {
      id_produto:   f.int(0)?,
      categoria:    f.text(1)?,
      nome_produto: f.text(2)?,
    })
  }

  fn values(&self) -> Vec<Value> {
    vec![
      Value::Int(self.id_produto.into()),
      Value::Text(self.categoria.clone()),
      Value::Text(self.nome_produto.clone()),
    ]
  }
}

impl Record for FactRow {
  const TABLE: &'static TableDef = &SEASONALITY_FACT;

  fn from_fields(row: usize, fields: &[String]) -> Result<Self, RecordError> {
    let f = Fields { table: Self::TABLE, row, fields };
    Ok(Self {
      id_produto:   f.int(0)?,
      id_mes:       f.int(1)?,
      nivel_oferta: f.code(2)?,
    })
  }

  fn values(&self) -> Vec<Value> {
    vec![
      Value::Int(self.id_produto.into()),
      Value::Int(self.id_mes.into()),
      Value::Text(self.nivel_oferta.to_string()),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_time_rows() {
    let ds = Dataset::from_rows(&["id_mes", "nome_mes"], [["1", "Jan"], [" 2 ", "Fev"]]).unwrap();
    let typed: Typed<TimeRow> = records(&ds).unwrap();
    assert!(typed.invalid.is_empty());
    assert_eq!(typed.rows, vec![
      TimeRow { id_mes: 1, nome_mes: "Jan".into() },
      TimeRow { id_mes: 2, nome_mes: "Fev".into() },
    ]);
  }

  #[test]
  fn header_must_match_catalog() {
    let ds = Dataset::from_rows(&["nome_mes", "id_mes"], [["Jan", "1"]]).unwrap();
    let err = records::<TimeRow>(&ds).unwrap_err();
    assert!(matches!(err, CatalogError::ColumnMismatch { table: "dim_tempo_mes", .. }));
  }

  #[test]
  fn non_numeric_key_is_invalid() {
    let ds = Dataset::from_rows(
      &["id_produto", "categoria", "nome_produto"],
      [["10", "Fruta", "Manga"], ["dez", "Fruta", "Caju"]],
    )
    .unwrap();

    let typed = records::<ProductRow>(&ds).unwrap();
    assert_eq!(typed.rows.len(), 1);
    assert_eq!(typed.invalid, vec![RecordError::Invalid {
      row:      2,
      column:   "id_produto",
      value:    "dez".into(),
      expected: "an integer",
    }]);
  }

  #[test]
  fn supply_level_is_one_character() {
    let ds = Dataset::from_rows(
      &["id_produto", "id_mes", "nivel_oferta"],
      [["10", "1", "AB"]],
    )
    .unwrap();
    let typed = records::<FactRow>(&ds).unwrap();
    assert!(typed.rows.is_empty());
    assert!(matches!(
      typed.invalid.as_slice(),
      [RecordError::Invalid { column: "nivel_oferta", .. }]
    ));

    let ds = Dataset::from_rows(
      &["id_produto", "id_mes", "nivel_oferta"],
      [["10", "1", "A"]],
    )
    .unwrap();
    let rows = records::<FactRow>(&ds).unwrap().rows;
    assert_eq!(rows[0].values(), vec![
      Value::Int(10),
      Value::Int(1),
      Value::Text("A".into()),
    ]);
  }

  #[test]
  fn empty_field_sets_only_its_row_aside() {
    let ds = Dataset::from_rows(&["id_mes", "nome_mes"], [["1", "Jan"], ["3", "  "], ["4", "Abr"]])
      .unwrap();
    let typed = records::<TimeRow>(&ds).unwrap();

    assert_eq!(typed.rows.iter().map(|r| r.id_mes).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(typed.invalid, vec![RecordError::Missing { row: 2, column: "nome_mes" }]);
  }
}
