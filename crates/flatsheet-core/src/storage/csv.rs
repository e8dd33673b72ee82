//! CSV reading and writing for the primary sheet file and import/export.

use crate::error::Result;

/// Parse CSV text into records. Rows may have differing widths.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// Serialize a header row and data rows to CSV text.
///
/// Fields containing a comma, quote or newline are quoted with inner quotes
/// doubled; everything else is written bare.
pub fn write_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
