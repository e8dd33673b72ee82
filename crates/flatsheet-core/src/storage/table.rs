//! Plain-text table rendering for tool responses.

/// Render headers and rows as a markdown table with 1-based row labels.
///
/// `row_labels` gives the label of each row (usually its 1-indexed row number).
pub fn render_table(headers: &[String], rows: &[Vec<String>], row_labels: &[usize]) -> String {
    let mut out = String::new();

    out.push_str("|   |");
    for header in headers {
        out.push_str(&format!(" {} |", escape_markdown(header)));
    }
    out.push('\n');

    out.push_str("|---|");
    for _ in headers {
        out.push_str("---|");
    }
    out.push('\n');

    for (row, label) in rows.iter().zip(row_labels) {
        out.push_str(&format!("| {} |", label));
        for value in row {
            out.push_str(&format!(" {} |", escape_markdown(value)));
        }
        out.push('\n');
    }
    out
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}
