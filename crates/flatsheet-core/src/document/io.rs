use super::Sheet;
use crate::config::StoreConfig;
use crate::error::{Result, SheetError};
use crate::model::{DumpResponse, ViewResponse};
use crate::storage::{parse_csv, read_formulas, replace_file, write_csv, write_formulas};
use flatsheet_engine::engine::Grid;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Build a grid from CSV records: first record is the header row.
///
/// Cells starting with `=` become formulas, evaluated in row-major order as
/// they are placed, then the whole grid is recalculated once.
fn grid_from_records(mut records: Vec<Vec<String>>) -> Grid {
    if records.is_empty() {
        return Grid::new(0, 0);
    }
    let headers = records.remove(0);

    let mut formulas = Vec::new();
    for (r, row) in records.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            if cell.starts_with('=') {
                formulas.push((r, c, std::mem::take(cell)));
            }
        }
    }

    let mut grid = Grid::from_rows(headers, records);
    for (r, c, formula) in formulas {
        grid.set_formula(r, c, formula);
    }
    grid.recalculate_all();
    grid
}

impl Sheet {
    /// Load an instance from its files.
    ///
    /// A missing primary file gives an empty grid of the default size.
    /// Sidecar formulas are merged by address, then everything is recalculated.
    pub fn load(name: &str, config: &StoreConfig) -> Result<Self> {
        let mut sheet = Sheet::empty(name, config)?;

        if sheet.csv_path.exists() {
            let text = std::fs::read_to_string(&sheet.csv_path)?;
            let mut records = parse_csv(&text)?;
            if !records.is_empty() {
                let headers = records.remove(0);
                sheet.grid = Grid::from_rows(headers, records);
            }
        }

        let formulas = read_formulas(&sheet.formulas_path)?;
        let formula_count = formulas.len();
        for (cell, formula) in formulas {
            if let Err(err) = sheet.check_limits(cell, cell.row + 1, cell.col + 1) {
                warn!(instance = name, error = %err, "skipping sidecar entry");
                continue;
            }
            sheet.grid.ensure_capacity(cell.row, cell.col);
            sheet.grid.set_formula(cell.row, cell.col, formula);
        }
        sheet.grid.recalculate_all();

        debug!(
            instance = name,
            rows = sheet.grid.row_count(),
            cols = sheet.grid.col_count(),
            formulas = formula_count,
            "loaded sheet"
        );
        Ok(sheet)
    }

    /// Write the primary CSV (trailing empty rows trimmed) and the formula sidecar.
    pub fn save(&self) -> Result<()> {
        let used = self.grid.used_rows();
        let rows: Vec<Vec<String>> = (0..used).map(|r| self.grid.row_values(r)).collect();
        let text = write_csv(self.grid.headers(), &rows)?;
        replace_file(&self.csv_path, text.as_bytes())?;
        write_formulas(&self.formulas_path, &self.grid)?;
        debug!(instance = %self.name, rows = used, path = %self.csv_path.display(), "saved sheet");
        Ok(())
    }

    /// Replace the whole grid with CSV from a file or inline text.
    pub fn ingest(&mut self, file: Option<&Path>, csv: Option<&str>) -> Result<ViewResponse> {
        let (text, source) = match (file, csv) {
            (Some(_), Some(_)) => return Err(SheetError::AmbiguousIngestSource),
            (None, None) => return Err(SheetError::MissingIngestSource),
            (Some(path), None) => (std::fs::read_to_string(path)?, path.display().to_string()),
            (None, Some(text)) => (text.to_string(), "inline csv".to_string()),
        };
        let records = parse_csv(&text)?;
        let rows = records.len().saturating_sub(1);
        let cols = records.iter().map(Vec::len).max().unwrap_or(0);
        self.check_limits(format!("CSV of {} rows x {} cols", rows, cols), rows, cols)?;
        self.grid = grid_from_records(records);
        self.commit(format!(
            "Ingested {} rows x {} cols from {}",
            self.grid.row_count(),
            self.grid.col_count(),
            source
        ))
    }

    /// Export the header and non-empty rows as CSV text, or write them to `file`.
    pub fn dump(&self, file: Option<&Path>) -> Result<DumpResponse> {
        let used = self.grid.used_rows();
        let rows: Vec<Vec<String>> = (0..used).map(|r| self.grid.row_values(r)).collect();
        let csv = write_csv(self.grid.headers(), &rows)?;
        match file {
            Some(path) => {
                replace_file(path, csv.as_bytes())?;
                Ok(DumpResponse::Written {
                    message: format!("Exported {} rows to {}", used, path.display()),
                    file: PathBuf::from(path),
                })
            }
            None => Ok(DumpResponse::Csv { csv }),
        }
    }
}
