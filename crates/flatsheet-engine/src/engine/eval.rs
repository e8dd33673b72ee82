//! Formula evaluation.
//!
//! [`evaluate`] parses a formula and walks the resulting tree against the
//! grid hosting it. It never fails: any error becomes [`ERROR_SENTINEL`].

use std::cmp::Ordering;
use thiserror::Error;
use tracing::trace;

use super::cell_ref::{CellRef, RangeRef, column_letter_to_index};
use super::format::{format_value, parse_number};
use super::grid::Grid;
use super::parser::{BinaryOp, Expr, RefToken, UnaryOp, parse_formula};
use crate::builtins;

/// Cell value produced by a failed evaluation.
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Internal evaluation failure; callers only ever see [`ERROR_SENTINEL`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("referenced cell holds an error")]
    Propagated,
}

/// A value flowing through a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    /// Numeric view: numbers, numeric text, empty text as 0, booleans as 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) if s.is_empty() => Some(0.0),
            Value::Text(s) => parse_number(s),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::List(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Text form, as the value would appear in a cell.
    pub fn to_text(&self) -> String {
        format_value(self)
    }
}

/// Evaluate `formula` (with or without its leading `=`) hosted at `(row, col)`.
pub fn evaluate(grid: &Grid, formula: &str, row: usize, col: usize) -> String {
    match try_evaluate(grid, formula) {
        Ok(value) => match value {
            Value::Number(n) if !n.is_finite() => ERROR_SENTINEL.to_string(),
            other => format_value(&other),
        },
        Err(err) => {
            trace!(row, col, formula, error = %err, "formula evaluation failed");
            ERROR_SENTINEL.to_string()
        }
    }
}

pub(crate) fn try_evaluate(grid: &Grid, formula: &str) -> Result<Value, EvalError> {
    let expr = parse_formula(formula)?;
    Evaluator { grid }.eval(&expr)
}

pub(crate) struct Evaluator<'a> {
    pub grid: &'a Grid,
}

impl Evaluator<'_> {
    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Ref(token) => self.reference(token),
            Expr::Range(start, end) => self.range(start, end),
            Expr::Call(name, args) => builtins::call(self, name, args),
            Expr::Unary(op, operand) => self.unary(*op, operand),
            Expr::Binary(op, left, right) => self.binary(*op, left, right),
        }
    }

    /// Column index for a reference column token.
    ///
    /// Column letters inside the grid win; otherwise a header name (exact,
    /// then case-insensitive); otherwise the letters even if out of range.
    fn column(&self, token: &str) -> Result<usize, EvalError> {
        let letters = column_letter_to_index(token).ok();
        if let Some(col) = letters.filter(|&c| c < self.grid.col_count()) {
            return Ok(col);
        }
        let headers = self.grid.headers();
        if let Some(col) = headers
            .iter()
            .position(|h| h == token)
            .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(token)))
        {
            return Ok(col);
        }
        letters.ok_or_else(|| EvalError::UnknownIdentifier(token.to_string()))
    }

    fn reference(&self, token: &RefToken) -> Result<Value, EvalError> {
        let Some(row) = token.row else {
            return Err(EvalError::UnknownIdentifier(token.column.clone()));
        };
        let col = self.column(&token.column)?;
        let raw = self.grid.value(row - 1, col);
        Ok(if raw.is_empty() {
            Value::Number(0.0)
        } else if raw == ERROR_SENTINEL {
            return Err(EvalError::Propagated);
        } else if let Some(n) = parse_number(raw) {
            Value::Number(n)
        } else {
            Value::Text(raw.to_string())
        })
    }

    /// Numeric values inside a range, row-major; blanks and text are skipped.
    fn range(&self, start: &RefToken, end: &RefToken) -> Result<Value, EvalError> {
        let start_col = self.column(&start.column)?;
        let end_col = self.column(&end.column)?;
        let range = match (start.row, end.row) {
            (Some(r1), Some(r2)) => RangeRef::Cells {
                start: CellRef::new(r1 - 1, start_col),
                end: CellRef::new(r2 - 1, end_col),
            },
            _ => RangeRef::Columns {
                start: start_col,
                end: end_col,
            },
        };
        let bounds = range
            .bounds(self.grid.row_count())
            .clip(self.grid.row_count(), self.grid.col_count());
        let mut values = Vec::new();
        for r in bounds.rows {
            for c in bounds.cols.clone() {
                if let Some(n) = parse_number(self.grid.value(r, c)) {
                    values.push(Value::Number(n));
                }
            }
        }
        Ok(Value::List(values))
    }

    fn unary(&self, op: UnaryOp, operand: &Expr) -> Result<Value, EvalError> {
        let value = self.eval(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOp::Neg => number(&value).map(|n| Value::Number(-n)),
            UnaryOp::Plus => number(&value).map(Value::Number),
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, EvalError> {
        // Short-circuit logic before evaluating the right side.
        match op {
            BinaryOp::And => {
                let l = self.eval(left)?;
                return Ok(Value::Bool(l.is_truthy() && self.eval(right)?.is_truthy()));
            }
            BinaryOp::Or => {
                let l = self.eval(left)?;
                return Ok(Value::Bool(l.is_truthy() || self.eval(right)?.is_truthy()));
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        match op {
            BinaryOp::Add => match (l.as_number(), r.as_number()) {
                (Some(a), Some(b)) => Ok(Value::Number(a + b)),
                _ => Ok(Value::Text(l.to_text() + &r.to_text())),
            },
            BinaryOp::Sub => Ok(Value::Number(number(&l)? - number(&r)?)),
            BinaryOp::Mul => Ok(Value::Number(number(&l)? * number(&r)?)),
            BinaryOp::Div => {
                let divisor = number(&r)?;
                if divisor == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Number(number(&l)? / divisor))
            }
            BinaryOp::Concat => Ok(Value::Text(l.to_text() + &r.to_text())),
            BinaryOp::Eq => Ok(Value::Bool(compare(&l, &r) == Ordering::Equal)),
            BinaryOp::Ne => Ok(Value::Bool(compare(&l, &r) != Ordering::Equal)),
            BinaryOp::Lt => Ok(Value::Bool(compare(&l, &r) == Ordering::Less)),
            BinaryOp::Le => Ok(Value::Bool(compare(&l, &r) != Ordering::Greater)),
            BinaryOp::Gt => Ok(Value::Bool(compare(&l, &r) == Ordering::Greater)),
            BinaryOp::Ge => Ok(Value::Bool(compare(&l, &r) != Ordering::Less)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }
}

pub(crate) fn number(value: &Value) -> Result<f64, EvalError> {
    value
        .as_number()
        .ok_or_else(|| EvalError::Type(format!("expected a number, got '{}'", value.to_text())))
}

/// Numeric when both sides are numbers, textual otherwise.
fn compare(l: &Value, r: &Value) -> Ordering {
    let numeric = |v: &Value| match v {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => parse_number(s),
        Value::List(_) => None,
    };
    match (numeric(l), numeric(r)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => l.to_text().cmp(&r.to_text()),
    }
}
