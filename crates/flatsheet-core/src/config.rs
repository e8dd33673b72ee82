//! Store settings shared by every instance of a workspace.

use flatsheet_engine::engine::{DEFAULT_COLS, DEFAULT_ROWS};
use std::path::PathBuf;

/// Largest row count a sheet may grow to.
pub const DEFAULT_MAX_ROWS: usize = 65_536;
/// Largest column count a sheet may grow to (`IV`).
pub const DEFAULT_MAX_COLS: usize = 256;

/// Where instance files live, how big a fresh sheet is and how far it may grow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub default_rows: usize,
    pub default_cols: usize,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            default_rows: DEFAULT_ROWS,
            default_cols: DEFAULT_COLS,
            max_rows: DEFAULT_MAX_ROWS,
            max_cols: DEFAULT_MAX_COLS,
        }
    }

    /// Primary value file: `<data_dir>/<name>.csv`.
    pub fn csv_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.csv"))
    }

    /// Formula sidecar: `<data_dir>/<name>.formulas.json`.
    pub fn formulas_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.formulas.json"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(".flatsheet")
    }
}
