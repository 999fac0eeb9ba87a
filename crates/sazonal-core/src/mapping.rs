//! Column mapping: rename and project a source [`Dataset`] onto the column
//! list of a catalog table.
//!
//! Rules are checked against the catalog when the mapping is built, so a
//! bad rule set is caught at startup rather than halfway through a load.

use crate::{catalog::TableDef, dataset::Dataset, error::MappingError};

#[derive(Debug, Clone)]
pub struct ColumnMapping {
  table:   &'static TableDef,
  renames: Vec<(String, &'static str)>,
}

impl ColumnMapping {
  /// A mapping for sources whose headers already use the table's names.
  pub fn identity(table: &'static TableDef) -> Self {
    Self { table, renames: Vec::new() }
  }

  /// Build a mapping from `(source, target)` rename rules.
  ///
  /// Every target must be a column of `table`, and neither a source nor a
  /// target may appear in more than one rule.
  pub fn new<I, S>(table: &'static TableDef, rules: I) -> Result<Self, MappingError>
  where
    I: IntoIterator<Item = (S, &'static str)>,
    S: Into<String>,
  {
    let mut renames: Vec<(String, &'static str)> = Vec::new();

    for (source, target) in rules {
      let source = source.into();
      let target = table
        .column(target)
        .map(|c| c.name)
        .ok_or_else(|| MappingError::UnknownTarget {
          table:  table.name,
          target: target.to_owned(),
        })?;

      if renames.iter().any(|(_, t)| *t == target) {
        return Err(MappingError::DuplicateTarget {
          table:  table.name,
          target: target.to_owned(),
        });
      }
      if renames.iter().any(|(s, _)| *s == source) {
        return Err(MappingError::DuplicateSource {
          table:         table.name,
          source_column: source,
        });
      }

      renames.push((source, target));
    }

    Ok(Self { table, renames })
  }

  pub fn table(&self) -> &'static TableDef { self.table }

  /// The catalog column a source column lands in, if any. Renamed sources
  /// take their rule's target; otherwise a source keeps its name when that
  /// name is a column of the table. Anything else is dropped.
  fn target_of(&self, source: &str) -> Option<&'static str> {
    if let Some((_, target)) = self.renames.iter().find(|(s, _)| s == source) {
      return Some(*target);
    }
    self.table.column(source).map(|c| c.name)
  }

  /// Produce a dataset with exactly the table's columns, in catalog order.
  ///
  /// Fails when a table column has no source, or when two source columns
  /// would both land in the same table column.
  pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, MappingError> {
    let mut sources: Vec<Option<usize>> = vec![None; self.table.columns.len()];

    for (index, name) in dataset.columns().iter().enumerate() {
      let Some(target) = self.target_of(name) else {
        continue;
      };
      let Some(slot) = self.table.columns.iter().position(|c| c.name == target) else {
        continue;
      };

      if let Some(previous) = sources[slot] {
        return Err(MappingError::Ambiguous {
          table:  self.table.name,
          target,
          first:  dataset.columns()[previous].clone(),
          second: name.clone(),
        });
      }
      sources[slot] = Some(index);
    }

    let indices = sources
      .into_iter()
      .zip(self.table.columns)
      .map(|(index, column)| {
        index.ok_or(MappingError::MissingColumn {
          table:  self.table.name,
          column: column.name,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let rows = dataset
      .rows()
      .iter()
      .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
      .collect();

    let columns = self.table.column_names().into_iter().map(str::to_owned).collect();

    Ok(Dataset::from_projection(columns, rows))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{PRODUCT_DIMENSION, SEASONALITY_FACT, TIME_DIMENSION};

  fn product_mapping() -> ColumnMapping {
    ColumnMapping::new(
      &PRODUCT_DIMENSION,
      [("Categoria", "categoria"), ("Produto", "nome_produto")],
    )
    .unwrap()
  }

  #[test]
  fn renames_and_reorders_to_catalog_order() {
    let source = Dataset::from_rows(
      &["Produto", "id_produto", "Categoria"],
      [["Manga", "10", "Fruta"], ["Alface", "11", "Verdura"]],
    )
    .unwrap();

    let mapped = product_mapping().apply(&source).unwrap();
    assert_eq!(mapped.columns(), ["id_produto", "categoria", "nome_produto"]);
    assert_eq!(mapped.rows()[0], ["10", "Fruta", "Manga"]);
    assert_eq!(mapped.rows()[1], ["11", "Verdura", "Alface"]);
  }

  #[test]
  fn extra_columns_are_dropped() {
    let source = Dataset::from_rows(
      &["id_mes", "nome_mes", "trimestre"],
      [["1", "Jan", "Q1"]],
    )
    .unwrap();

    let mapped = ColumnMapping::identity(&TIME_DIMENSION).apply(&source).unwrap();
    assert_eq!(mapped.columns(), ["id_mes", "nome_mes"]);
    assert_eq!(mapped.rows()[0], ["1", "Jan"]);
  }

  #[test]
  fn missing_column_is_reported() {
    let source = Dataset::from_rows(&["id_produto", "id_mes"], [["10", "1"]]).unwrap();
    let mapping = ColumnMapping::new(&SEASONALITY_FACT, [("Nivel_Oferta", "nivel_oferta")]).unwrap();

    assert_eq!(
      mapping.apply(&source).unwrap_err(),
      MappingError::MissingColumn { table: "fato_sazonalidade", column: "nivel_oferta" }
    );
  }

  #[test]
  fn two_sources_for_one_target_is_ambiguous() {
    let source = Dataset::from_rows(
      &["id_produto", "Categoria", "categoria", "Produto"],
      [["10", "Fruta", "Legume", "Manga"]],
    )
    .unwrap();

    let err = product_mapping().apply(&source).unwrap_err();
    assert!(matches!(err, MappingError::Ambiguous { target: "categoria", .. }));
  }

  #[test]
  fn rules_with_duplicate_targets_are_rejected() {
    let err = ColumnMapping::new(
      &PRODUCT_DIMENSION,
      [("Categoria", "categoria"), ("Tipo", "categoria")],
    )
    .unwrap_err();
    assert!(matches!(err, MappingError::DuplicateTarget { .. }));
  }

  #[test]
  fn rules_with_unknown_targets_are_rejected() {
    let err = ColumnMapping::new(&PRODUCT_DIMENSION, [("Preco", "preco")]).unwrap_err();
    assert!(matches!(err, MappingError::UnknownTarget { .. }));
  }

  #[test]
  fn rules_with_duplicate_sources_are_rejected() {
    let err = ColumnMapping::new(
      &PRODUCT_DIMENSION,
      [("Produto", "nome_produto"), ("Produto", "categoria")],
    )
    .unwrap_err();
    assert!(matches!(err, MappingError::DuplicateSource { .. }));
  }
}
