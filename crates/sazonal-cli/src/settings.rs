//! Layered settings: defaults, then the TOML file, then `SAZONAL_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use sazonal_core::{
  catalog::{PRODUCT_DIMENSION, SEASONALITY_FACT, TIME_DIMENSION, TableDef},
  pipeline::PipelineOptions,
};
use sazonal_store_sqlite::SqliteConfig;
use serde::Deserialize;

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Everything a run needs, built once in `main` and passed down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub database: SqliteConfig,
  pub sources:  SourcePaths,
  pub pipeline: PipelineOptions,
}

/// CSV file for each table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
  pub time:    PathBuf,
  pub product: PathBuf,
  pub fact:    PathBuf,
}

impl Default for SourcePaths {
  fn default() -> Self {
    Self {
      time:    PathBuf::from("dim_tempo_mes.csv"),
      product: PathBuf::from("dim_produto.csv"),
      fact:    PathBuf::from("fato_sazonalidade.csv"),
    }
  }
}

impl SourcePaths {
  /// The file for one of the catalog's tables. Every table that is not a
  /// dimension is the fact table.
  pub fn for_table(&self, table: &TableDef) -> &Path {
    match table.name {
      n if n == TIME_DIMENSION.name => self.time.as_path(),
      n if n == PRODUCT_DIMENSION.name => self.product.as_path(),
      n => {
        debug_assert_eq!(n, SEASONALITY_FACT.name);
        self.fact.as_path()
      }
    }
  }
}

/// Values given on the command line; `None` leaves lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub database_path:              Option<PathBuf>,
  pub time:                       Option<PathBuf>,
  pub product:                    Option<PathBuf>,
  pub fact:                       Option<PathBuf>,
  pub continue_on_schema_failure: bool,
}

impl Settings {
  pub fn load(file: &Path, overrides: &Overrides) -> Result<Self, config::ConfigError> {
    Self::load_from(file, environment(), overrides)
  }

  fn load_from(
    file: &Path,
    env: config::Environment,
    overrides: &Overrides,
  ) -> Result<Self, config::ConfigError> {
    let path_value = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(env)
      .set_override_option("database.path", path_value(&overrides.database_path))?
      .set_override_option("sources.time", path_value(&overrides.time))?
      .set_override_option("sources.product", path_value(&overrides.product))?
      .set_override_option("sources.fact", path_value(&overrides.fact))?
      .set_override_option(
        "pipeline.continue_on_schema_failure",
        overrides.continue_on_schema_failure.then_some(true),
      )?
      .build()?
      .try_deserialize()
  }
}

/// `SAZONAL_DATABASE__PATH`, `SAZONAL_SOURCES__FACT` and so on.
fn environment() -> config::Environment {
  config::Environment::with_prefix("SAZONAL")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}
