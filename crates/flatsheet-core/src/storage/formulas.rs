//! Formula sidecar file: a flat JSON object of cell address -> formula text.
//!
//! ```json
//! { "A3": "=SUM(A1:A2)", "B1": "=A1*2" }
//! ```
//!
//! The file only exists while the sheet has at least one formula.

use std::collections::BTreeMap;
use std::path::Path;

use flatsheet_engine::engine::{CellRef, Grid, parse_cell_ref};
use tracing::warn;

use super::replace_file;
use crate::error::Result;

/// Read formulas keyed by cell. Missing file means no formulas.
///
/// Entries with malformed addresses or non-formula text are skipped.
pub fn read_formulas(path: &Path) -> Result<Vec<(CellRef, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let map: BTreeMap<String, String> = serde_json::from_str(&content)?;

    let mut formulas = Vec::with_capacity(map.len());
    for (address, formula) in map {
        match parse_cell_ref(&address) {
            Ok(cell) if formula.starts_with('=') => formulas.push((cell, formula)),
            Ok(_) => warn!(%address, path = %path.display(), "skipping sidecar entry without '='"),
            Err(err) => warn!(%address, path = %path.display(), error = %err, "skipping sidecar entry"),
        }
    }
    Ok(formulas)
}

/// Write the grid's formulas, or delete the sidecar when there are none.
pub fn write_formulas(path: &Path, grid: &Grid) -> Result<()> {
    if !grid.has_formulas() {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        return Ok(());
    }

    let map: BTreeMap<String, &str> = grid
        .formula_cells()
        .map(|(cell, formula)| (cell.to_string(), formula))
        .collect();
    let json = serde_json::to_string_pretty(&map)?;
    replace_file(path, json.as_bytes())
}
