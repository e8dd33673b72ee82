use super::eval::Value;

/// Format a formula value as cell text.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Format a number rounded to 8 decimal places, without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e8).round() / 1e8;
    // Avoid "-0" for tiny negative results.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    if rounded.is_finite() {
        rounded.to_string()
    } else {
        n.to_string()
    }
}

/// Parse cell text as a finite number. Empty text, `inf` and `NaN` are not numbers.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
