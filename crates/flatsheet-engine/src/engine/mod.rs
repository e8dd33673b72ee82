//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellRef`], [`RangeRef`], [`Bounds`] - A1 references, ranges and their bounds
//! - [`Grid`] - Dense value/formula planes plus headers
//! - [`evaluate`] - Evaluate a formula against a grid (errors become [`ERROR_SENTINEL`])
//! - [`Grid::recalculate_all`] - Single-pass, row-major recalculation
//! - [`format_number`] - Format numbers for display

mod cell_ref;
pub(crate) mod eval;
mod format;
mod grid;
pub(crate) mod parser;
mod token;

pub use cell_ref::{
    Bounds, CellRef, RangeRef, column_letter_to_index, index_to_column_letter, parse_cell_ref,
    parse_range, resolve_column,
};
pub use eval::{ERROR_SENTINEL, EvalError, Value, evaluate};
pub use format::{format_number, format_value, parse_number};
pub use grid::{DEFAULT_COLS, DEFAULT_ROWS, Grid, default_headers};
