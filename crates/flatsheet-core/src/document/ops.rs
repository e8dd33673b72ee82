use super::Sheet;
use crate::error::Result;
use crate::model::{SortOrder, ViewResponse};
use flatsheet_engine::EngineError;
use flatsheet_engine::engine::{Grid, RangeRef, parse_cell_ref, parse_number, parse_range};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Numeric when both sides parse as numbers, otherwise by text.
pub(crate) fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

impl Sheet {
    /// Resolve every column key up front so a bad key fails before any write.
    fn resolve_values(&self, values: &BTreeMap<String, String>) -> Result<Vec<(usize, String)>> {
        values
            .iter()
            .map(|(column, value)| Ok((self.column_index(column)?, value.clone())))
            .collect()
    }

    /// Set one cell; a leading `=` stores a formula.
    pub fn set(&mut self, cell: &str, value: &str) -> Result<ViewResponse> {
        let cell_ref = parse_cell_ref(cell.trim())?;
        self.check_limits(cell_ref, cell_ref.row + 1, cell_ref.col + 1)?;
        self.grid.set_cell(cell_ref.row, cell_ref.col, value);
        self.commit(format!("Set {} to {}", cell_ref, value))
    }

    /// Write a row into the first fully-empty row, or append one.
    pub fn add(&mut self, values: &BTreeMap<String, String>) -> Result<ViewResponse> {
        let resolved = self.resolve_values(values)?;
        let row = (0..self.grid.row_count())
            .find(|&r| self.grid.is_row_empty(r))
            .unwrap_or(self.grid.row_count());
        self.check_limits(format!("Row {}", row + 1), row + 1, 0)?;
        for (col, value) in &resolved {
            self.grid.set_cell(row, *col, value);
        }
        self.commit(format!("Added row {}", row + 1))
    }

    /// Delete a 1-indexed row.
    pub fn remove(&mut self, row: usize) -> Result<ViewResponse> {
        self.grid.remove_row(row)?;
        self.commit(format!("Removed row {}", row))
    }

    /// Overwrite selected columns of an existing 1-indexed row.
    pub fn update(&mut self, row: usize, values: &BTreeMap<String, String>) -> Result<ViewResponse> {
        if row == 0 || row > self.grid.row_count() {
            return Err(EngineError::RowNotFound {
                row,
                row_count: self.grid.row_count(),
            }
            .into());
        }
        let resolved = self.resolve_values(values)?;
        for (col, value) in &resolved {
            self.grid.set_cell(row - 1, *col, value);
        }
        self.commit(format!("Updated row {}", row))
    }

    /// Stable sort of all rows by one column. Empty keys always go last.
    pub fn sort(&mut self, column: &str, order: SortOrder) -> Result<ViewResponse> {
        let col = self.column_index(column)?;
        let grid = &self.grid;
        let mut indices: Vec<usize> = (0..grid.row_count()).collect();
        indices.sort_by(|&a, &b| {
            let (ka, kb) = (grid.value(a, col), grid.value(b, col));
            match (ka.is_empty(), kb.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match order {
                    SortOrder::Asc => compare_values(ka, kb),
                    SortOrder::Desc => compare_values(kb, ka),
                },
            }
        });
        self.grid.reorder_rows(&indices);
        let direction = match order {
            SortOrder::Asc => "ascending",
            SortOrder::Desc => "descending",
        };
        self.commit(format!(
            "Sorted by {} {}",
            self.grid.headers()[col],
            direction
        ))
    }

    /// Repeat a comma-separated pattern across a range, row-major.
    pub fn fill(&mut self, range: &str, pattern: &str) -> Result<ViewResponse> {
        let range_ref = parse_range(range)?;
        let items: Vec<&str> = pattern.split(',').map(str::trim).collect();

        let bounds = match range_ref {
            RangeRef::Columns { .. } => range_ref.bounds(self.grid.row_count()),
            RangeRef::Cells { .. } => range_ref.bounds(0),
        };
        self.check_limits(&range_ref, bounds.rows.end, bounds.cols.end)?;
        if bounds.cols.end > 0 {
            self.grid.ensure_capacity(
                bounds.rows.end.saturating_sub(1),
                bounds.cols.end - 1,
            );
        }

        let mut written = 0usize;
        for r in bounds.rows.clone() {
            for c in bounds.cols.clone() {
                self.grid.set_value(r, c, items[written % items.len()]);
                written += 1;
            }
        }
        self.commit(format!("Filled {} cells in {}", written, range_ref))
    }

    /// Set explicit dimensions; shrinking discards cells.
    pub fn resize(&mut self, rows: Option<usize>, cols: Option<usize>) -> Result<ViewResponse> {
        let (target_rows, target_cols) = (
            rows.unwrap_or(self.grid.row_count()),
            cols.unwrap_or(self.grid.col_count()),
        );
        self.check_limits(
            format!("Size {} x {}", target_rows, target_cols),
            target_rows,
            target_cols,
        )?;
        self.grid.resize(rows, cols);
        self.commit(format!(
            "Resized to {} rows x {} cols",
            self.grid.row_count(),
            self.grid.col_count()
        ))
    }

    /// Clear a range, or reset the whole sheet to a fresh default grid.
    pub fn clear(&mut self, range: Option<&str>) -> Result<ViewResponse> {
        let message = match range {
            Some(range) => {
                let range_ref = parse_range(range)?;
                self.grid.clear_range(&range_ref.bounds(self.grid.row_count()));
                format!("Cleared {}", range_ref)
            }
            None => {
                self.grid = Grid::new(self.default_rows, self.default_cols);
                "Cleared sheet".to_string()
            }
        };
        self.commit(message)
    }

    /// Rename a column header.
    pub fn rename(&mut self, column: &str, name: &str) -> Result<ViewResponse> {
        let col = self.column_index(column)?;
        let old = self.grid.headers()[col].clone();
        self.grid.set_header(col, name);
        self.commit(format!("Renamed column {} to {}", old, name))
    }

    /// Re-run every formula once.
    pub fn recalculate(&mut self) -> Result<ViewResponse> {
        let count = self.grid.formula_cells().count();
        self.commit(format!("Recalculated {} formulas", count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::SheetError;
    use pretty_assertions::assert_eq;

    fn sheet(dir: &tempfile::TempDir) -> Sheet {
        Sheet::load("ops", &StoreConfig::new(dir.path())).unwrap()
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values("9", "10"), Ordering::Less);
        assert_eq!(compare_values("b", "a"), Ordering::Greater);
        assert_eq!(compare_values("10", "9x"), Ordering::Less);
    }

    #[test]
    fn test_set_stores_formula_and_recalculates() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.set("A1", "=A2+1").unwrap();
        let view = sheet.set("A2", "4").unwrap();
        assert_eq!(view.data[0][0], "5");
        assert!(matches!(
            sheet.set("1A", "x"),
            Err(SheetError::Engine(EngineError::InvalidReference(_)))
        ));
    }

    #[test]
    fn test_add_fills_first_empty_row_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.resize(Some(1), Some(2)).unwrap();
        sheet.rename("A", "Name").unwrap();

        sheet.add(&values(&[("Name", "Ada"), ("B", "36")])).unwrap();
        assert_eq!(sheet.grid().row_count(), 1);
        let view = sheet.add(&values(&[("name", "Bob")])).unwrap();
        assert_eq!(sheet.grid().row_count(), 2);
        assert_eq!(view.data[1], vec!["Bob".to_string(), String::new()]);
    }

    #[test]
    fn test_add_rejects_unknown_column_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        let err = sheet
            .add(&values(&[("A", "kept?"), ("ZZ", "x")]))
            .unwrap_err();
        assert!(matches!(err, SheetError::UnknownColumn(_)));
        assert_eq!(sheet.grid().value(0, 0), "");
    }

    #[test]
    fn test_update_and_remove_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.resize(Some(2), Some(2)).unwrap();
        assert!(matches!(
            sheet.update(3, &values(&[("A", "x")])),
            Err(SheetError::Engine(EngineError::RowNotFound { row: 3, row_count: 2 }))
        ));
        sheet.update(2, &values(&[("B", "=1+1")])).unwrap();
        assert_eq!(sheet.grid().value(1, 1), "2");
        assert!(sheet.remove(0).is_err());
        sheet.remove(1).unwrap();
        assert_eq!(sheet.grid().formula(0, 1), Some("=1+1"));
    }

    #[test]
    fn test_sort_puts_empty_keys_last_in_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.ingest(None, Some("k,v\nb,2\na,\nc,10")).unwrap();

        sheet.sort("v", SortOrder::Asc).unwrap();
        let keys: Vec<&str> = (0..3).map(|r| sheet.grid().value(r, 0)).collect();
        assert_eq!(keys, ["b", "c", "a"]);

        sheet.sort("B", SortOrder::Desc).unwrap();
        let keys: Vec<&str> = (0..3).map(|r| sheet.grid().value(r, 0)).collect();
        assert_eq!(keys, ["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable_and_moves_formulas() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.ingest(None, Some("k,n\nx,1\ny,1\nz,0")).unwrap();
        sheet.set("C1", "=\"first\"").unwrap();
        sheet.sort("n", SortOrder::Asc).unwrap();
        let keys: Vec<&str> = (0..3).map(|r| sheet.grid().value(r, 0)).collect();
        assert_eq!(keys, ["z", "x", "y"]);
        assert_eq!(sheet.grid().formula(1, 2), Some("=\"first\""));
    }

    #[test]
    fn test_fill_repeats_pattern_and_clears_formulas() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.set("A3", "=1+1").unwrap();
        sheet.fill("A1:A4", "1, 2").unwrap();
        let column: Vec<&str> = (0..4).map(|r| sheet.grid().value(r, 0)).collect();
        assert_eq!(column, ["1", "2", "1", "2"]);
        assert_eq!(sheet.grid().formula(2, 0), None);
    }

    #[test]
    fn test_fill_grows_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.fill("K25:L25", "x").unwrap();
        assert_eq!(sheet.grid().row_count(), 25);
        assert_eq!(sheet.grid().col_count(), 12);
        assert_eq!(sheet.grid().value(24, 11), "x");
    }

    #[test]
    fn test_clear_range_and_whole_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.ingest(None, Some("a,b\n1,2\n3,4")).unwrap();
        sheet.clear(Some("B:B")).unwrap();
        assert_eq!(sheet.grid().value(0, 1), "");
        assert_eq!(sheet.grid().value(0, 0), "1");

        sheet.clear(None).unwrap();
        assert_eq!(sheet.grid().row_count(), 20);
        assert_eq!(sheet.grid().headers()[0], "A");
    }

    #[test]
    fn test_rename_then_reference_by_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.set("B2", "7").unwrap();
        sheet.rename("B", "Price").unwrap();
        let view = sheet.set("C1", "=Price2*2").unwrap();
        assert_eq!(view.data[0][2], "14");
        assert_eq!(view.headers[1], "Price");
    }

    #[test]
    fn test_rename_keeps_empty_grid_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);
        sheet.ingest(None, Some("Name,Age")).unwrap();
        let view = sheet.rename("Age", "Years").unwrap();
        assert_eq!(sheet.grid().row_count(), 0);
        assert_eq!(view.rows, 0);
        assert_eq!(view.headers, ["Name", "Years"]);
    }

    #[test]
    fn test_growth_past_limit_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sheet(&dir);

        assert!(matches!(
            sheet.set("A4000000000", "x"),
            Err(SheetError::LimitExceeded { .. })
        ));
        assert!(sheet.set("ZZZ1", "x").is_err());
        assert!(sheet.fill("A1:A70000", "x").is_err());
        assert!(sheet.fill("A:IW", "x").is_err());
        assert!(sheet.resize(Some(1_000_000), None).is_err());
        assert_eq!(sheet.grid().row_count(), 20);
        assert_eq!(sheet.grid().col_count(), 10);
        assert_eq!(sheet.grid().value(0, 0), "");
        assert!(!sheet.csv_path().exists());
    }

    #[test]
    fn test_limits_follow_store_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            max_rows: 3,
            max_cols: 2,
            ..StoreConfig::new(dir.path())
        };
        let mut sheet = Sheet::load("small", &config).unwrap();
        sheet.resize(Some(3), Some(2)).unwrap();
        sheet.add(&values(&[("A", "1")])).unwrap();
        sheet.add(&values(&[("A", "2")])).unwrap();
        sheet.add(&values(&[("A", "3")])).unwrap();
        assert!(matches!(
            sheet.add(&values(&[("A", "4")])),
            Err(SheetError::LimitExceeded { max_rows: 3, max_cols: 2, .. })
        ));
        assert!(sheet.ingest(None, Some("a,b,c\n1,2,3")).is_err());
        assert_eq!(sheet.grid().row_count(), 3);
    }
}
