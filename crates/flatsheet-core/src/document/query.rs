use super::Sheet;
use super::ops::compare_values;
use crate::error::{Result, SheetError};
use crate::model::{
    ColumnSchema, ColumnType, GetResponse, QueryResponse, SchemaResponse, ViewResponse,
};
use crate::storage::render_table;
use flatsheet_engine::engine::{index_to_column_letter, parse_cell_ref, parse_number, parse_range};
use std::cmp::Ordering;

/// Comparison operators, longest first so `>=` is never read as `>`.
const OPERATORS: [&str; 7] = [">=", "<=", "!=", ">", "<", "=", "contains"];

/// A parsed `<column> <op> <value>` condition.
#[derive(Debug, PartialEq)]
struct Condition<'a> {
    column: &'a str,
    op: &'a str,
    value: &'a str,
}

fn parse_condition(text: &str) -> Result<Condition<'_>> {
    let invalid = || SheetError::InvalidCondition(text.to_string());
    // The leftmost operator splits, so operators inside the value stay part of it.
    let (at, op) = text
        .char_indices()
        .find_map(|(at, _)| operator_at(text, at).map(|op| (at, op)))
        .ok_or_else(invalid)?;
    let column = text[..at].trim();
    if column.is_empty() {
        return Err(invalid());
    }
    Ok(Condition {
        column,
        op,
        value: strip_quotes(text[at + op.len()..].trim()),
    })
}

fn operator_at(text: &str, at: usize) -> Option<&'static str> {
    let rest = &text[at..];
    OPERATORS.into_iter().find(|op| {
        if !rest.starts_with(op) {
            return false;
        }
        if *op != "contains" {
            return true;
        }
        // `contains` only counts as a whole word, so `mycontains` stays a column name.
        let before = text[..at].chars().next_back();
        let after = rest[op.len()..].chars().next();
        before.is_some_and(char::is_whitespace)
            && after.is_none_or(|c| c.is_whitespace() || c == '"' || c == '\'')
    })
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn condition_holds(cell: &str, op: &str, target: &str) -> bool {
    if op == "contains" {
        return cell.to_lowercase().contains(&target.to_lowercase());
    }
    let ordering = compare_values(cell, target);
    match op {
        ">=" => ordering != Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        "!=" => ordering != Ordering::Equal,
        ">" => ordering == Ordering::Greater,
        "<" => ordering == Ordering::Less,
        _ => ordering == Ordering::Equal,
    }
}

impl Sheet {
    /// The whole grid, or one range of it.
    pub fn view(&self, range: Option<&str>) -> Result<ViewResponse> {
        let Some(range) = range else {
            let message = format!(
                "Sheet '{}': {} rows x {} cols",
                self.name,
                self.grid.row_count(),
                self.grid.col_count()
            );
            return Ok(self.snapshot(message));
        };
        let range_ref = parse_range(range)?;
        let bounds = range_ref.bounds(self.grid.row_count());
        Ok(self.render(&bounds, format!("Range {}", range_ref)))
    }

    pub fn get(&self, cell: &str) -> Result<GetResponse> {
        let cell_ref = parse_cell_ref(cell.trim())?;
        let value = self.grid.value(cell_ref.row, cell_ref.col).to_string();
        let formula = self
            .grid
            .formula(cell_ref.row, cell_ref.col)
            .map(str::to_string);
        let message = match &formula {
            Some(f) => format!("{} = {} ({})", cell_ref, value, f),
            None => format!("{} = {}", cell_ref, value),
        };
        Ok(GetResponse {
            cell: cell_ref.to_string(),
            value,
            formula,
            message,
        })
    }

    /// Rows whose column satisfies `<column> <op> <value>`, skipping blank rows.
    pub fn query(&self, condition: &str, limit: Option<usize>) -> Result<QueryResponse> {
        let condition = parse_condition(condition)?;
        let col = self.column_index(condition.column)?;

        let mut rows = Vec::new();
        for r in 0..self.grid.row_count() {
            if limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
            let values = self.grid.row_values(r);
            if values.iter().all(String::is_empty) {
                continue;
            }
            if condition_holds(&values[col], condition.op, condition.value) {
                rows.push(r + 1);
            }
        }

        let headers = self.grid.headers().to_vec();
        let data: Vec<Vec<String>> = rows.iter().map(|&r| self.grid.row_values(r - 1)).collect();
        Ok(QueryResponse {
            table: render_table(&headers, &data, &rows),
            match_count: rows.len(),
            data,
            headers,
            rows,
        })
    }

    /// Per-column type summary: `number` when every non-empty cell is numeric.
    pub fn schema(&self) -> SchemaResponse {
        let total = self.grid.row_count();
        let columns = (0..self.grid.col_count())
            .map(|col| {
                let mut non_empty = 0;
                let mut all_numeric = true;
                for row in 0..total {
                    let value = self.grid.value(row, col);
                    if value.is_empty() {
                        continue;
                    }
                    non_empty += 1;
                    all_numeric &= parse_number(value).is_some();
                }
                let column_type = match (non_empty, all_numeric) {
                    (0, _) => ColumnType::Empty,
                    (_, true) => ColumnType::Number,
                    (_, false) => ColumnType::Text,
                };
                ColumnSchema {
                    column: index_to_column_letter(col),
                    header: self.grid.headers()[col].clone(),
                    column_type,
                    non_empty,
                    total,
                }
            })
            .collect();
        SchemaResponse { columns }
    }
}
