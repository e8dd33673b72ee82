//! Error types for the Flatsheet engine.

use thiserror::Error;

/// Errors raised by addressing and grid-structure operations.
///
/// Formula evaluation never produces one of these; evaluation failures
/// surface as the [`ERROR_SENTINEL`](crate::engine::ERROR_SENTINEL) cell value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Row {row} not found (sheet has {row_count} rows)")]
    RowNotFound { row: usize, row_count: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
