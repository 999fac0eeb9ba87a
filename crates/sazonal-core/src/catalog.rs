//! The star-schema catalog.
//!
//! Every table, column and key the loader knows about is declared here once.
//! The DDL, the column mapper and the bulk loader all read from these
//! definitions; nothing else spells out a column name.

use std::fmt;

use crate::error::CatalogError;

/// Name of the database that holds the star schema.
pub const DATABASE_NAME: &str = "db_sazonalidade_agricola";

// ─── Definitions ─────────────────────────────────────────────────────────────

/// SQL column type, rendered verbatim into the DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
  Int,
  VarChar(u16),
  Char(u16),
}

impl fmt::Display for SqlType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SqlType::Int => f.write_str("INT"),
      SqlType::VarChar(n) => write!(f, "VARCHAR({n})"),
      SqlType::Char(n) => write!(f, "CHAR({n})"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
  pub name:     &'static str,
  pub sql_type: SqlType,
  pub nullable: bool,
}

/// A named single-column foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
  pub name:              &'static str,
  pub column:            &'static str,
  pub references:        &'static str,
  pub referenced_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
  pub name:         &'static str,
  pub columns:      &'static [ColumnDef],
  pub primary_key:  &'static [&'static str],
  pub foreign_keys: &'static [ForeignKey],
}

// ─── The star schema ─────────────────────────────────────────────────────────

/// Calendar months.
pub const TIME_DIMENSION: TableDef = TableDef {
  name:         "dim_tempo_mes",
  columns:      &[
    ColumnDef { name: "id_mes",   sql_type: SqlType::Int,         nullable: false },
    ColumnDef { name: "nome_mes", sql_type: SqlType::VarChar(10), nullable: false },
  ],
  primary_key:  &["id_mes"],
  foreign_keys: &[],
};

/// Products and their categories.
pub const PRODUCT_DIMENSION: TableDef = TableDef {
  name:         "dim_produto",
  columns:      &[
    ColumnDef { name: "id_produto",   sql_type: SqlType::Int,          nullable: false },
    ColumnDef { name: "categoria",    sql_type: SqlType::VarChar(50),  nullable: false },
    ColumnDef { name: "nome_produto", sql_type: SqlType::VarChar(100), nullable: false },
  ],
  primary_key:  &["id_produto"],
  foreign_keys: &[],
};

/// Supply level of a product in a month. One row per (product, month).
pub const SEASONALITY_FACT: TableDef = TableDef {
  name:         "fato_sazonalidade",
  columns:      &[
    ColumnDef { name: "id_produto",   sql_type: SqlType::Int,     nullable: false },
    ColumnDef { name: "id_mes",       sql_type: SqlType::Int,     nullable: false },
    ColumnDef { name: "nivel_oferta", sql_type: SqlType::Char(1), nullable: false },
  ],
  primary_key:  &["id_produto", "id_mes"],
  foreign_keys: &[
    ForeignKey {
      name:              "fk_produto",
      column:            "id_produto",
      references:        "dim_produto",
      referenced_column: "id_produto",
    },
    ForeignKey {
      name:              "fk_mes",
      column:            "id_mes",
      references:        "dim_tempo_mes",
      referenced_column: "id_mes",
    },
  ],
};

/// All tables, in creation and load order: dimensions before the fact.
pub const TABLES: [&TableDef; 3] = [&TIME_DIMENSION, &PRODUCT_DIMENSION, &SEASONALITY_FACT];

// ─── Behaviour ───────────────────────────────────────────────────────────────

impl TableDef {
  pub fn column_names(&self) -> Vec<&'static str> {
    self.columns.iter().map(|c| c.name).collect()
  }

  pub fn column(&self, name: &str) -> Option<&ColumnDef> {
    self.columns.iter().find(|c| c.name == name)
  }

  /// `table` or `schema.table`.
  pub fn qualified_name(&self, schema: Option<&str>) -> String {
    match schema {
      Some(s) => format!("{s}.{}", self.name),
      None => self.name.to_owned(),
    }
  }

  /// Check that `columns` is exactly this table's column list, in order.
  pub fn check_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), CatalogError> {
    let matches = columns.len() == self.columns.len()
      && columns
        .iter()
        .zip(self.columns)
        .all(|(given, def)| given.as_ref() == def.name);

    if columns.is_empty() || !matches {
      return Err(CatalogError::ColumnMismatch {
        table:    self.name,
        expected: self.column_names(),
        found:    columns.iter().map(|c| c.as_ref().to_owned()).collect(),
      });
    }
    Ok(())
  }

  /// Render the idempotent `CREATE TABLE` statement for this table.
  ///
  /// A single-column primary key is declared inline on its column; a
  /// composite key and the foreign keys become table constraints. Foreign
  /// key targets stay unqualified so they resolve inside the same schema.
  pub fn create_statement(&self, schema: Option<&str>) -> String {
    let inline_pk = match self.primary_key {
      [single] => Some(*single),
      _ => None,
    };

    let mut lines: Vec<String> = self
      .columns
      .iter()
      .map(|c| {
        if inline_pk == Some(c.name) {
          format!("{} {} PRIMARY KEY", c.name, c.sql_type)
        } else if c.nullable {
          format!("{} {}", c.name, c.sql_type)
        } else {
          format!("{} {} NOT NULL", c.name, c.sql_type)
        }
      })
      .collect();

    if inline_pk.is_none() && !self.primary_key.is_empty() {
      lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
    }

    for fk in self.foreign_keys {
      lines.push(format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        fk.name, fk.column, fk.references, fk.referenced_column
      ));
    }

    format!(
      "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
      self.qualified_name(schema),
      lines.join(",\n    ")
    )
  }
}

/// Verify that `tables` is a valid creation order: every foreign key points
/// at a column of a table that appears earlier in the slice.
pub fn check_order(tables: &[&TableDef]) -> Result<(), CatalogError> {
  for (position, table) in tables.iter().enumerate() {
    for fk in table.foreign_keys {
      if table.column(fk.column).is_none() {
        return Err(CatalogError::UnknownColumn { table: table.name, column: fk.column });
      }

      let target = tables[..position]
        .iter()
        .find(|t| t.name == fk.references)
        .ok_or(CatalogError::ForwardReference {
          table:      table.name,
          references: fk.references,
        })?;

      if target.column(fk.referenced_column).is_none() {
        return Err(CatalogError::UnknownColumn {
          table:  target.name,
          column: fk.referenced_column,
        });
      }
    }
  }
  Ok(())
}
