//! `sazonal-etl`: loads the agricultural seasonality star schema.
//!
//! Reads `sazonal.toml` (or the path given with `--config`), opens the
//! SQLite store, creates the schema if needed and loads `dim_tempo_mes`,
//! `dim_produto` and `fato_sazonalidade` from CSV. Rows whose key already
//! exists are skipped, so re-running against the same files inserts nothing.
//!
//! # Usage
//!
//! ```text
//! sazonal-etl --database ./warehouse.db \
//!   --time dim_tempo_mes.csv --product dim_produto.csv --fact fato_sazonalidade.csv
//! PATH_TEMPO=tempo.csv PATH_PRODUTO=produto.csv PATH_FATO=fato.csv sazonal-etl --json
//! ```
//!
//! # Connection
//!
//! The store is a local SQLite file, so there are no host, port, user,
//! password or TLS settings, and `TIDB_*` variables are not read. The
//! connection is configured with `database.path` (`--database`),
//! `database.data_dir` and `database.busy_timeout_ms`, in `sazonal.toml` or
//! as `SAZONAL_DATABASE__*` variables.

mod settings;
mod source;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use sazonal_core::{
  pipeline::Pipeline,
  report::{RunReport, TableOutcome},
};
use sazonal_store_sqlite::SqliteProvider;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  settings::{Overrides, Settings},
  source::CsvSource,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Idempotent loader for the seasonality star schema",
  after_help = "The target is a local SQLite database: host, port, credential and TLS \
                options (TIDB_*) do not apply. Set database.path, database.data_dir and \
                database.busy_timeout_ms in the config file or as SAZONAL_DATABASE__* \
                variables."
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sazonal.toml")]
  config: PathBuf,

  /// Main SQLite database file (`:memory:` for a throwaway run).
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  /// CSV for `dim_tempo_mes`.
  #[arg(long, env = "PATH_TEMPO", value_name = "FILE")]
  time: Option<PathBuf>,

  /// CSV for `dim_produto`.
  #[arg(long, env = "PATH_PRODUTO", value_name = "FILE")]
  product: Option<PathBuf>,

  /// CSV for `fato_sazonalidade`.
  #[arg(long, env = "PATH_FATO", value_name = "FILE")]
  fact: Option<PathBuf>,

  /// Keep loading when schema creation fails.
  #[arg(long)]
  continue_on_schema_failure: bool,

  /// Print the run report as JSON instead of a summary.
  #[arg(long)]
  json: bool,

  /// Exit non-zero when any table failed to load.
  #[arg(long)]
  strict: bool,
}

impl Cli {
  fn overrides(&self) -> Overrides {
    Overrides {
      database_path:              self.database.clone(),
      time:                       self.time.clone(),
      product:                    self.product.clone(),
      fact:                       self.fact.clone(),
      continue_on_schema_failure: self.continue_on_schema_failure,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config, &cli.overrides())
    .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
  tracing::debug!(?settings, "settings loaded");

  let pipeline = Pipeline::new(
    SqliteProvider::new(settings.database),
    CsvSource::new(settings.sources),
    settings.pipeline,
  )
  .context("invalid load definition")?;

  let report = pipeline.run().context("load run aborted")?;

  if cli.json {
    println!(
      "{}",
      serde_json::to_string_pretty(&report).context("failed to serialise run report")?
    );
  } else {
    print_summary(&report);
  }

  if cli.strict && report.has_failures() {
    bail!("run {} finished with failures", report.run_id);
  }
  Ok(())
}

fn print_summary(report: &RunReport) {
  println!("run {}", report.run_id);
  if !report.schema_ok {
    println!("  schema     initialisation failed, existing tables used");
  }
  for outcome in &report.tables {
    match outcome {
      TableOutcome::Loaded(r) => println!(
        "  {:<18} {:>6} read {:>6} inserted {:>6} skipped {:>6} rejected",
        r.table, r.attempted, r.counts.inserted, r.counts.ignored, r.counts.rejected,
      ),
      TableOutcome::Failed { table, error } => println!("  {table:<18} FAILED: {error}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dataset_paths_fall_back_to_environment() {
    // SAFETY: no other test in this binary reads or writes these variables.
    unsafe {
      std::env::set_var("PATH_TEMPO", "/env/tempo.csv");
      std::env::set_var("PATH_FATO", "/env/fato.csv");
      std::env::remove_var("PATH_PRODUTO");
    }

    let cli = Cli::try_parse_from(["sazonal-etl", "--fact", "/flag/fato.csv"]).unwrap();
    let overrides = cli.overrides();

    unsafe {
      std::env::remove_var("PATH_TEMPO");
      std::env::remove_var("PATH_FATO");
    }

    assert_eq!(overrides.time, Some(PathBuf::from("/env/tempo.csv")));
    assert_eq!(overrides.product, None);
    assert_eq!(overrides.fact, Some(PathBuf::from("/flag/fato.csv")));
    assert_eq!(cli.config, PathBuf::from("sazonal.toml"));
  }
}
