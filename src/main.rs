//! Flatsheet - a flat-file spreadsheet engine driven from the command line.

mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use flatsheet_core::Workspace;
use std::io::Write;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{AppConfig, Settings};

fn init_logging() {
    let filter = EnvFilter::try_from_env("FLATSHEET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if compact {
        serde_json::to_writer(&mut handle, value)?;
    } else {
        serde_json::to_writer_pretty(&mut handle, value)?;
    }
    handle.write_all(b"\n")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let file_config = AppConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file_config);
    debug!(
        data_dir = %settings.store.data_dir.display(),
        instance = %settings.instance,
        "resolved settings"
    );

    let compact = cli.compact;
    let request = cli.command.into_request()?;
    let operation = request.name();
    let workspace = Workspace::new(settings.store);
    let response = workspace
        .dispatch(&settings.instance, request)
        .with_context(|| format!("{} failed on instance '{}'", operation, settings.instance))?;

    emit(&response, compact)
}
