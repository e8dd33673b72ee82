use crate::config::StoreConfig;
use crate::error::{Result, SheetError};
use crate::model::ViewResponse;
use crate::storage::render_table;
use flatsheet_engine::engine::{Bounds, Grid, resolve_column};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// A named grid plus the pair of files it is persisted to.
///
/// Created by [`Sheet::load`]; every mutating operation ends in
/// [`Sheet::save`].
#[derive(Debug, Clone)]
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) grid: Grid,
    pub(crate) csv_path: PathBuf,
    pub(crate) formulas_path: PathBuf,
    pub(crate) default_rows: usize,
    pub(crate) default_cols: usize,
    pub(crate) max_rows: usize,
    pub(crate) max_cols: usize,
}

/// Instance names become file names, so only `[A-Za-z0-9_-]+` is allowed.
pub fn validate_instance_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SheetError::InvalidInstanceName(name.to_string()))
    }
}

impl Sheet {
    /// An empty, unsaved sheet with the configured default dimensions.
    pub fn empty(name: &str, config: &StoreConfig) -> Result<Self> {
        validate_instance_name(name)?;
        Ok(Sheet {
            name: name.to_string(),
            grid: Grid::new(config.default_rows, config.default_cols),
            csv_path: config.csv_path(name),
            formulas_path: config.formulas_path(name),
            default_rows: config.default_rows,
            default_cols: config.default_cols,
            max_rows: config.max_rows,
            max_cols: config.max_cols,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn formulas_path(&self) -> &Path {
        &self.formulas_path
    }

    /// Column index for a header name or column letters, which must lie in the grid.
    pub(crate) fn column_index(&self, token: &str) -> Result<usize> {
        let col = resolve_column(token, self.grid.headers())?;
        if col >= self.grid.col_count() {
            return Err(SheetError::UnknownColumn(token.to_string()));
        }
        Ok(col)
    }

    /// Fails when making room for `rows` x `cols` would grow the grid past the limit.
    ///
    /// A grid already larger than the limit (from a bigger CSV) stays usable up to its size.
    pub(crate) fn check_limits(
        &self,
        target: impl Display,
        rows: usize,
        cols: usize,
    ) -> Result<()> {
        let rows_over = rows > self.max_rows && rows > self.grid.row_count();
        let cols_over = cols > self.max_cols && cols > self.grid.col_count();
        if rows_over || cols_over {
            return Err(SheetError::LimitExceeded {
                target: target.to_string(),
                max_rows: self.max_rows,
                max_cols: self.max_cols,
            });
        }
        Ok(())
    }

    pub(crate) fn whole_grid(&self) -> Bounds {
        Bounds {
            rows: 0..self.grid.row_count(),
            cols: 0..self.grid.col_count(),
        }
    }

    /// Render `bounds` (clipped to the grid) as a view payload.
    pub(crate) fn render(&self, bounds: &Bounds, message: String) -> ViewResponse {
        let bounds = bounds.clip(self.grid.row_count(), self.grid.col_count());
        let headers = self.grid.headers()[bounds.cols.clone()].to_vec();
        let data = self.grid.values_in(&bounds);
        let labels: Vec<usize> = bounds.rows.clone().map(|r| r + 1).collect();
        ViewResponse {
            table: render_table(&headers, &data, &labels),
            rows: data.len(),
            cols: headers.len(),
            data,
            headers,
            message,
        }
    }

    /// The whole grid as a view payload carrying `message`.
    pub(crate) fn snapshot(&self, message: String) -> ViewResponse {
        self.render(&self.whole_grid(), message)
    }

    /// Recalculate, save and return the snapshot for a finished mutation.
    pub(crate) fn commit(&mut self, message: String) -> Result<ViewResponse> {
        self.grid.recalculate_all();
        self.save()?;
        Ok(self.snapshot(message))
    }
}
