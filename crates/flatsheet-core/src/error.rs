//! Error types for Flatsheet core.

use flatsheet_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while operating on a sheet instance.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Provide either a file or inline csv to ingest")]
    MissingIngestSource,

    #[error("Provide only one of file or csv to ingest, not both")]
    AmbiguousIngestSource,

    #[error("Invalid condition '{0}': expected <column> <op> <value>")]
    InvalidCondition(String),

    #[error("{target} is outside the sheet limit of {max_rows} rows x {max_cols} cols")]
    LimitExceeded {
        target: String,
        max_rows: usize,
        max_cols: usize,
    },

    #[error("Invalid instance name '{0}': use letters, digits, '-' or '_'")]
    InvalidInstanceName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Formula file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
