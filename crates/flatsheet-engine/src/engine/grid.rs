//! Dense grid storage for the spreadsheet.
//!
//! A [`Grid`] holds two planes of identical shape:
//! - the value plane: the text shown in each cell (empty string = unset)
//! - the formula plane: the formula driving each cell (`=`-prefixed) or empty
//!
//! plus one header per column. Every row of both planes always has exactly
//! `col_count` entries and `headers.len() == col_count`.

use tracing::debug;

use super::cell_ref::{Bounds, CellRef, index_to_column_letter};
use super::eval::evaluate;
use crate::error::{EngineError, Result};

/// Rows of a freshly initialised grid.
pub const DEFAULT_ROWS: usize = 20;
/// Columns of a freshly initialised grid.
pub const DEFAULT_COLS: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    data: Vec<Vec<String>>,
    formulas: Vec<Vec<String>>,
    headers: Vec<String>,
    cols: usize,
}

/// Auto-generated headers `A`, `B`, ... for `count` columns.
pub fn default_headers(count: usize) -> Vec<String> {
    (0..count).map(index_to_column_letter).collect()
}

impl Grid {
    /// An empty grid with auto-generated headers.
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid {
            data: vec![vec![String::new(); cols]; rows],
            formulas: vec![vec![String::new(); cols]; rows],
            headers: default_headers(cols),
            cols,
        }
    }

    /// Build a grid from a header row and value rows.
    ///
    /// The width is the widest of the header row and every data row; short
    /// rows are padded and missing header names are auto-generated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let cols = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);
        let mut grid = Grid::new(rows.len(), cols);
        for (idx, name) in headers.into_iter().enumerate() {
            grid.headers[idx] = name;
        }
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                grid.data[r][c] = value;
            }
        }
        grid
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rename a column, widening the grid if needed. Never adds rows.
    pub fn set_header(&mut self, col: usize, name: impl Into<String>) {
        self.ensure_cols(col);
        self.headers[col] = name.into();
    }

    /// Value at a position; positions past capacity read as empty.
    pub fn value(&self, row: usize, col: usize) -> &str {
        self.data
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Formula at a position, if any.
    pub fn formula(&self, row: usize, col: usize) -> Option<&str> {
        self.formulas
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    /// Grow (never shrink) until `row < row_count` and `col < col_count`.
    pub fn ensure_capacity(&mut self, row: usize, col: usize) {
        self.ensure_cols(col);
        while row >= self.data.len() {
            self.data.push(vec![String::new(); self.cols]);
            self.formulas.push(vec![String::new(); self.cols]);
        }
    }

    fn ensure_cols(&mut self, col: usize) {
        if col < self.cols {
            return;
        }
        let new_cols = col + 1;
        for r in self.data.iter_mut().chain(self.formulas.iter_mut()) {
            r.resize(new_cols, String::new());
        }
        for idx in self.cols..new_cols {
            self.headers.push(index_to_column_letter(idx));
        }
        self.cols = new_cols;
    }

    /// Store a literal value, dropping any formula at that position.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.ensure_capacity(row, col);
        self.data[row][col] = value.into();
        self.formulas[row][col].clear();
    }

    /// Store a formula and evaluate it once against the current grid.
    pub fn set_formula(&mut self, row: usize, col: usize, formula: impl Into<String>) {
        self.ensure_capacity(row, col);
        let formula = formula.into();
        let value = evaluate(self, &formula, row, col);
        self.formulas[row][col] = formula;
        self.data[row][col] = value;
    }

    /// Store user input: text starting with `=` becomes a formula.
    pub fn set_cell(&mut self, row: usize, col: usize, input: &str) {
        if input.starts_with('=') {
            self.set_formula(row, col, input);
        } else {
            self.set_value(row, col, input);
        }
    }

    /// Remove a 1-indexed row from both planes.
    pub fn remove_row(&mut self, row_number: usize) -> Result<()> {
        if row_number == 0 || row_number > self.row_count() {
            return Err(EngineError::RowNotFound {
                row: row_number,
                row_count: self.row_count(),
            });
        }
        self.data.remove(row_number - 1);
        self.formulas.remove(row_number - 1);
        Ok(())
    }

    /// Explicitly set dimensions; truncation discards values, formulas and headers.
    pub fn resize(&mut self, rows: Option<usize>, cols: Option<usize>) {
        if let Some(cols) = cols {
            for r in self.data.iter_mut().chain(self.formulas.iter_mut()) {
                r.resize(cols, String::new());
            }
            if cols < self.cols {
                self.headers.truncate(cols);
            } else {
                for idx in self.cols..cols {
                    self.headers.push(index_to_column_letter(idx));
                }
            }
            self.cols = cols;
        }
        if let Some(rows) = rows {
            self.data.resize(rows, vec![String::new(); self.cols]);
            self.formulas.resize(rows, vec![String::new(); self.cols]);
        }
    }

    /// Clear values and formulas inside `bounds` (clipped to the grid).
    pub fn clear_range(&mut self, bounds: &Bounds) {
        let bounds = bounds.clip(self.row_count(), self.cols);
        for r in bounds.rows {
            for c in bounds.cols.clone() {
                self.data[r][c].clear();
                self.formulas[r][c].clear();
            }
        }
    }

    /// True when every value and formula in the row is empty.
    pub fn is_row_empty(&self, row: usize) -> bool {
        let values_empty = self
            .data
            .get(row)
            .is_none_or(|r| r.iter().all(String::is_empty));
        let formulas_empty = self
            .formulas
            .get(row)
            .is_none_or(|r| r.iter().all(String::is_empty));
        values_empty && formulas_empty
    }

    /// Number of rows left after dropping trailing empty rows.
    pub fn used_rows(&self) -> usize {
        (0..self.row_count())
            .rev()
            .find(|&r| !self.is_row_empty(r))
            .map_or(0, |r| r + 1)
    }

    /// Copy of a row's values.
    pub fn row_values(&self, row: usize) -> Vec<String> {
        self.data.get(row).cloned().unwrap_or_default()
    }

    /// Copy of the values inside `bounds` (clipped to the grid).
    pub fn values_in(&self, bounds: &Bounds) -> Vec<Vec<String>> {
        let bounds = bounds.clip(self.row_count(), self.cols);
        bounds
            .rows
            .map(|r| self.data[r][bounds.cols.clone()].to_vec())
            .collect()
    }

    /// Permute rows so that new row `i` is old row `order[i]`.
    ///
    /// `order` must be a permutation of `0..row_count`; both planes move together.
    pub fn reorder_rows(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.row_count());
        let mut data = std::mem::take(&mut self.data);
        let mut formulas = std::mem::take(&mut self.formulas);
        self.data = order.iter().map(|&i| std::mem::take(&mut data[i])).collect();
        self.formulas = order
            .iter()
            .map(|&i| std::mem::take(&mut formulas[i]))
            .collect();
    }

    /// Every formula cell in row-major order.
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellRef, &str)> + '_ {
        self.formulas.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, f)| !f.is_empty())
                .map(move |(c, f)| (CellRef::new(r, c), f.as_str()))
        })
    }

    pub fn has_formulas(&self) -> bool {
        self.formulas.iter().flatten().any(|f| !f.is_empty())
    }

    /// Re-evaluate every formula cell once, row-major, writing results in place.
    ///
    /// There is no dependency ordering: a formula that reads a cell later in
    /// sweep order sees that cell's value from before this pass.
    pub fn recalculate_all(&mut self) {
        let mut evaluated = 0usize;
        for r in 0..self.row_count() {
            for c in 0..self.cols {
                if self.formulas[r][c].is_empty() {
                    continue;
                }
                let value = evaluate(self, &self.formulas[r][c], r, c);
                self.data[r][c] = value;
                evaluated += 1;
            }
        }
        debug!(evaluated, "recalculated grid");
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}
