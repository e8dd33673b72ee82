//! flatsheet_engine - Spreadsheet engine: addressing, grid store, formulas.

pub mod builtins;
pub mod engine;
pub mod error;

pub use error::{EngineError, Result};
