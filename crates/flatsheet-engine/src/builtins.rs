//! Built-in spreadsheet functions.
//!
//! Conventions:
//! - Names are matched case-insensitively and stored ALL CAPS (`SUM`, `AVG`).
//! - Aggregates flatten every argument: lists (ranges, `[...]`), numbers and
//!   numeric text count; other text and booleans are skipped.
//! - Aggregates over no numbers return 0, including `MAX` and `MIN`.
//! - `IF` evaluates only the branch it takes.

use crate::engine::eval::{EvalError, Evaluator, Value, number};
use crate::engine::parse_number;
use crate::engine::parser::Expr;

pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        description: "Sum of the numeric arguments",
    },
    Builtin {
        name: "AVG",
        description: "Average of the numeric arguments",
    },
    Builtin {
        name: "AVERAGE",
        description: "Alias of AVG",
    },
    Builtin {
        name: "MAX",
        description: "Largest numeric argument (0 when there are none)",
    },
    Builtin {
        name: "MIN",
        description: "Smallest numeric argument (0 when there are none)",
    },
    Builtin {
        name: "COUNT",
        description: "Count of numeric arguments",
    },
    Builtin {
        name: "IF",
        description: "IF(cond, then, else): evaluate one branch",
    },
    Builtin {
        name: "LEN",
        description: "Length of the text form of a value",
    },
    Builtin {
        name: "CONCAT",
        description: "Join the text forms of all arguments",
    },
    Builtin {
        name: "ABS",
        description: "Absolute value",
    },
    Builtin {
        name: "ROUND",
        description: "ROUND(x[, digits]): round half away from zero",
    },
];

/// True if `name` (any case) is a built-in function.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|b| b.name.eq_ignore_ascii_case(name))
}

pub(crate) fn call(ev: &Evaluator<'_>, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
    match name {
        "IF" => {
            check_arity("IF", "2 or 3", args, 2..=3)?;
            let cond = ev.eval(&args[0])?;
            if cond.is_truthy() {
                ev.eval(&args[1])
            } else {
                args.get(2)
                    .map_or(Ok(Value::Bool(false)), |branch| ev.eval(branch))
            }
        }
        "SUM" | "AVG" | "AVERAGE" | "MAX" | "MIN" | "COUNT" => {
            let values = eval_all(ev, args)?;
            let mut numbers = Vec::new();
            flatten_numbers(&values, &mut numbers);
            Ok(Value::Number(aggregate(name, &numbers)))
        }
        "LEN" => {
            check_arity("LEN", "1", args, 1..=1)?;
            let value = ev.eval(&args[0])?;
            Ok(Value::Number(value.to_text().chars().count() as f64))
        }
        "ABS" => {
            check_arity("ABS", "1", args, 1..=1)?;
            Ok(Value::Number(number(&ev.eval(&args[0])?)?.abs()))
        }
        "ROUND" => {
            check_arity("ROUND", "1 or 2", args, 1..=2)?;
            let x = number(&ev.eval(&args[0])?)?;
            let digits = match args.get(1) {
                Some(arg) => number(&ev.eval(arg)?)?.trunc() as i32,
                None => 0,
            };
            let factor = 10f64.powi(digits);
            Ok(Value::Number((x * factor).round() / factor))
        }
        "CONCAT" => {
            let joined: String = eval_all(ev, args)?.iter().map(Value::to_text).collect();
            Ok(Value::Text(joined))
        }
        other => Err(EvalError::UnknownFunction(other.to_string())),
    }
}

fn eval_all(ev: &Evaluator<'_>, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
    args.iter().map(|arg| ev.eval(arg)).collect()
}

fn check_arity(
    name: &'static str,
    expected: &'static str,
    args: &[Expr],
    allowed: std::ops::RangeInclusive<usize>,
) -> Result<(), EvalError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name,
            expected,
            got: args.len(),
        })
    }
}

fn flatten_numbers(values: &[Value], out: &mut Vec<f64>) {
    for value in values {
        match value {
            Value::Number(n) => out.push(*n),
            Value::Text(s) => out.extend(parse_number(s)),
            Value::List(items) => flatten_numbers(items, out),
            Value::Bool(_) => {}
        }
    }
}

fn aggregate(name: &str, numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let sum: f64 = numbers.iter().sum();
    match name {
        "SUM" => sum,
        "AVG" | "AVERAGE" => sum / numbers.len() as f64,
        "MAX" => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "MIN" => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        _ => numbers.len() as f64,
    }
}
