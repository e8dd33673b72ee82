use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use flatsheet_core::{Request, SortOrder};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Asc,
            Order::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "flatsheet",
    version,
    about = "Flat-file spreadsheet engine: CSV values plus a formula sidecar"
)]
pub struct Cli {
    /// Directory holding `<instance>.csv` and `<instance>.formulas.json`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Sheet instance to operate on.
    #[arg(short, long, global = true)]
    pub instance: Option<String>,

    /// Config file (default: the platform config dir's flatsheet/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print single-line JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the sheet, or a range such as `A1:C5` or `B:B`.
    View { range: Option<String> },
    /// Show one cell's value and formula.
    Get { cell: String },
    /// Set a cell; a value starting with `=` is a formula.
    Set {
        cell: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Add a row from `COLUMN=VALUE` pairs.
    Add {
        #[arg(value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },
    /// Remove a row (1-indexed).
    Remove { row: usize },
    /// Update a row (1-indexed) from `COLUMN=VALUE` pairs.
    Update {
        row: usize,
        #[arg(value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },
    /// Rows matching `<column> <op> <value>`.
    Query {
        #[arg(value_name = "WHERE")]
        condition: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Sort rows by a column.
    Sort {
        column: String,
        #[arg(long, value_enum, default_value_t = Order::Asc)]
        order: Order,
    },
    /// Fill a range with a repeating comma-separated pattern.
    Fill { range: String, pattern: String },
    /// Per-column type summary.
    Schema,
    /// Set explicit dimensions.
    Resize {
        #[arg(long)]
        rows: Option<usize>,
        #[arg(long)]
        cols: Option<usize>,
    },
    /// Replace the sheet with CSV from a file or inline text.
    Ingest {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        csv: Option<String>,
    },
    /// Export the sheet as CSV.
    Dump {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Clear a range, or the whole sheet.
    Clear { range: Option<String> },
    /// Rename a column header.
    Rename { column: String, name: String },
    /// Re-run every formula.
    Recalculate,
    /// Run a JSON request, e.g. `{"op":"set","cell":"A1","value":"3"}`.
    Exec { request: String },
}

/// `Name=Ada` -> ("Name", "Ada"). The value may itself contain `=`.
fn parse_assignment(text: &str) -> Result<(String, String)> {
    let (column, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected COLUMN=VALUE, got '{text}'"))?;
    Ok((column.trim().to_string(), value.to_string()))
}

fn to_map(values: Vec<(String, String)>) -> BTreeMap<String, String> {
    values.into_iter().collect()
}

impl Commands {
    pub fn into_request(self) -> Result<Request> {
        let request = match self {
            Commands::View { range } => Request::View { range },
            Commands::Get { cell } => Request::Get { cell },
            Commands::Set { cell, value } => Request::Set { cell, value },
            Commands::Add { values } => Request::Add {
                values: to_map(values),
            },
            Commands::Remove { row } => Request::Remove { row },
            Commands::Update { row, values } => Request::Update {
                row,
                values: to_map(values),
            },
            Commands::Query { condition, limit } => Request::Query { condition, limit },
            Commands::Sort { column, order } => Request::Sort {
                column,
                order: order.into(),
            },
            Commands::Fill { range, pattern } => Request::Fill { range, pattern },
            Commands::Schema => Request::Schema,
            Commands::Resize { rows, cols } => Request::Resize { rows, cols },
            Commands::Ingest { file, csv } => Request::Ingest { file, csv },
            Commands::Dump { file } => Request::Dump { file },
            Commands::Clear { range } => Request::Clear { range },
            Commands::Rename { column, name } => Request::Rename { column, name },
            Commands::Recalculate => Request::Recalculate,
            Commands::Exec { request } => {
                serde_json::from_str(&request).context("Invalid JSON request")?
            }
        };
        Ok(request)
    }
}
