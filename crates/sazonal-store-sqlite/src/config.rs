//! Connection settings for the SQLite backend.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Special path that keeps everything in memory for the session's lifetime.
pub const MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
  /// Database file the session opens. `:memory:` for a throwaway session.
  pub path:            PathBuf,
  /// Directory holding the attached star-schema database file. Defaults to
  /// the directory of `path`.
  pub data_dir:        Option<PathBuf>,
  /// How long a statement waits on a locked database before failing.
  pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
  fn default() -> Self {
    Self {
      path:            PathBuf::from("sazonal.db"),
      data_dir:        None,
      busy_timeout_ms: 5_000,
    }
  }
}

impl SqliteConfig {
  pub fn in_memory() -> Self {
    Self { path: PathBuf::from(MEMORY), ..Self::default() }
  }

  pub fn is_in_memory(&self) -> bool { self.path.as_os_str() == MEMORY }

  /// The file that backs `database`, or `None` when it lives in memory.
  pub fn database_file(&self, database: &str) -> Option<PathBuf> {
    let dir = match (&self.data_dir, self.is_in_memory()) {
      (Some(dir), _) => dir.clone(),
      (None, true) => return None,
      (None, false) => self.path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Some(dir.join(format!("{database}.db")))
  }
}
