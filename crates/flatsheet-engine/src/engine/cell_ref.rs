//! Cell and range reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! range parsing for `A1:B2` and whole-column `B:B` spans.
//!
//! # Examples
//!
//! ```
//! use flatsheet_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use crate::error::{EngineError, Result};

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$").unwrap())
}

fn column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+$").unwrap())
}

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        index_to_column_letter(col)
    }
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse_cell_ref(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", index_to_column_letter(self.col), self.row + 1)
    }
}

/// Convert column letters to a zero-based index ("A" -> 0, "Z" -> 25, "AA" -> 26).
///
/// Case-insensitive. Fails on anything but ASCII letters and on overflow.
pub fn column_letter_to_index(name: &str) -> Result<usize> {
    if !column_re().is_match(name) {
        return Err(EngineError::InvalidReference(name.to_string()));
    }
    let mut acc = 0usize;
    for c in name.to_ascii_uppercase().bytes() {
        let digit = (c - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| EngineError::InvalidReference(name.to_string()))?;
    }
    Ok(acc - 1)
}

/// Convert a zero-based column index to its canonical uppercase letters.
pub fn index_to_column_letter(index: usize) -> String {
    let mut result = String::new();
    let mut n = index as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Parse an `A1`-style reference into zero-based coordinates.
pub fn parse_cell_ref(text: &str) -> Result<CellRef> {
    let invalid = || EngineError::InvalidReference(text.to_string());
    let caps = cell_re().captures(text).ok_or_else(invalid)?;
    let col = column_letter_to_index(&caps["letters"])?;
    let row = caps["numbers"]
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(invalid)?;
    Ok(CellRef::new(row, col))
}

/// Split `Price12` into (`"Price"`, 12). Row numbers are 1-indexed and must be non-zero.
pub(crate) fn split_ref_token(token: &str) -> Option<(&str, usize)> {
    let caps = cell_re().captures(token)?;
    let letters = caps.name("letters")?.as_str();
    let row = caps["numbers"].parse::<usize>().ok().filter(|&n| n > 0)?;
    Some((letters, row))
}

/// A parsed range: either whole columns or a rectangle of cells.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeRef {
    Columns { start: usize, end: usize },
    Cells { start: CellRef, end: CellRef },
}

/// Half-open row/column bounds of a resolved range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bounds {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Bounds {
    /// Restrict to a `row_count x col_count` grid.
    pub fn clip(&self, row_count: usize, col_count: usize) -> Bounds {
        Bounds {
            rows: self.rows.start.min(row_count)..self.rows.end.min(row_count),
            cols: self.cols.start.min(col_count)..self.cols.end.min(col_count),
        }
    }
}

impl RangeRef {
    /// Resolve to bounds; whole-column ranges span `0..row_count`.
    pub fn bounds(&self, row_count: usize) -> Bounds {
        match *self {
            RangeRef::Columns { start, end } => Bounds {
                rows: 0..row_count,
                cols: start.min(end)..start.max(end) + 1,
            },
            RangeRef::Cells { start, end } => Bounds {
                rows: start.row.min(end.row)..start.row.max(end.row) + 1,
                cols: start.col.min(end.col)..start.col.max(end.col) + 1,
            },
        }
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRef::Columns { start, end } => write!(
                f,
                "{}:{}",
                index_to_column_letter(*start),
                index_to_column_letter(*end)
            ),
            RangeRef::Cells { start, end } => write!(f, "{}:{}", start, end),
        }
    }
}

/// Parse `A1:B5` or `B:D` into a [`RangeRef`].
pub fn parse_range(text: &str) -> Result<RangeRef> {
    let invalid = || EngineError::InvalidRange(text.to_string());
    let (left, right) = text.trim().split_once(':').ok_or_else(invalid)?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return Err(invalid());
    }

    if column_re().is_match(left) && column_re().is_match(right) {
        return Ok(RangeRef::Columns {
            start: column_letter_to_index(left).map_err(|_| invalid())?,
            end: column_letter_to_index(right).map_err(|_| invalid())?,
        });
    }

    match (parse_cell_ref(left), parse_cell_ref(right)) {
        (Ok(start), Ok(end)) => Ok(RangeRef::Cells { start, end }),
        _ => Err(invalid()),
    }
}

/// Resolve a column token that may be a header name or column letters.
///
/// Exact header match wins, then a case-insensitive header match, then the
/// token is parsed as column letters (whose error is returned unchanged).
pub fn resolve_column(token: &str, headers: &[String]) -> Result<usize> {
    let token = token.trim();
    if let Some(idx) = headers.iter().position(|h| h == token) {
        return Ok(idx);
    }
    if let Some(idx) = headers.iter().position(|h| h.eq_ignore_ascii_case(token)) {
        return Ok(idx);
    }
    column_letter_to_index(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_a1_overflow_is_invalid() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(matches!(
            parse_cell_ref(&huge),
            Err(EngineError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_column_bijection_two_letters() {
        for i in 0..=701 {
            let letters = index_to_column_letter(i);
            assert_eq!(column_letter_to_index(&letters).unwrap(), i, "{letters}");
        }
        assert_eq!(index_to_column_letter(701), "ZZ");
    }

    #[test]
    fn test_parse_range_forms() {
        assert_eq!(
            parse_range("B:B").unwrap(),
            RangeRef::Columns { start: 1, end: 1 }
        );
        assert_eq!(
            parse_range("A1:B5").unwrap(),
            RangeRef::Cells {
                start: CellRef::new(0, 0),
                end: CellRef::new(4, 1)
            }
        );
        assert_eq!(parse_range("A1:B5").unwrap().to_string(), "A1:B5");
    }

    #[test]
    fn test_parse_range_rejects_missing_side() {
        for bad in ["A1:", ":B2", "A1", "A:B2", "", ":"] {
            assert!(
                matches!(parse_range(bad), Err(EngineError::InvalidRange(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_bounds_normalise_reversed_endpoints() {
        let bounds = parse_range("C4:A2").unwrap().bounds(10);
        assert_eq!(bounds.rows, 1..4);
        assert_eq!(bounds.cols, 0..3);
    }

    #[test]
    fn test_column_range_spans_all_rows() {
        let bounds = parse_range("B:C").unwrap().bounds(7);
        assert_eq!(bounds.rows, 0..7);
        assert_eq!(bounds.cols, 1..3);
    }

    #[test]
    fn test_resolve_column_prefers_headers() {
        let headers = vec!["Name".to_string(), "A".to_string(), "age".to_string()];
        assert_eq!(resolve_column("Name", &headers).unwrap(), 0);
        // Header "A" sits in column B and wins over the letter.
        assert_eq!(resolve_column("A", &headers).unwrap(), 1);
        assert_eq!(resolve_column("AGE", &headers).unwrap(), 2);
        assert_eq!(resolve_column("D", &headers).unwrap(), 3);
        assert!(resolve_column("Total 2", &headers).is_err());
    }

    #[test]
    fn test_split_ref_token() {
        assert_eq!(split_ref_token("Price12"), Some(("Price", 12)));
        assert_eq!(split_ref_token("A0"), None);
        assert_eq!(split_ref_token("A1B"), None);
    }
}
