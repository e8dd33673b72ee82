//! Optional `config.toml` and the resolved runtime settings.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use flatsheet_core::StoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

const DEFAULT_INSTANCE: &str = "default";

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// data_dir = "/home/me/sheets"
/// default_rows = 50
/// default_cols = 8
/// max_rows = 100000
/// max_cols = 52
/// default_instance = "budget"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub default_rows: Option<usize>,
    pub default_cols: Option<usize>,
    pub max_rows: Option<usize>,
    pub max_cols: Option<usize>,
    pub default_instance: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "flatsheet")
}

fn user_config_path() -> Option<PathBuf> {
    let proj = project_dirs()?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|proj| proj.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".flatsheet"))
}

impl AppConfig {
    /// Read the config file.
    ///
    /// An explicit path must exist. The per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match user_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(AppConfig::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Settings after applying CLI flag > config file > built-in default.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub store: StoreConfig,
    pub instance: String,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: AppConfig) -> Self {
        let data_dir = cli
            .data_dir
            .clone()
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);
        let mut store = StoreConfig::new(data_dir);
        if let Some(rows) = file.default_rows {
            store.default_rows = rows;
        }
        if let Some(cols) = file.default_cols {
            store.default_cols = cols;
        }
        if let Some(rows) = file.max_rows {
            store.max_rows = rows;
        }
        if let Some(cols) = file.max_cols {
            store.max_cols = cols;
        }
        let instance = cli
            .instance
            .clone()
            .or(file.default_instance)
            .unwrap_or_else(|| DEFAULT_INSTANCE.to_string());
        Settings { store, instance }
    }
}
