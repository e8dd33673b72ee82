//! On-disk formats: primary CSV, formula sidecar, and text tables.

pub mod csv;
pub mod formulas;
pub mod table;

pub use self::csv::{parse_csv, write_csv};
pub use formulas::{read_formulas, write_formulas};
pub use table::render_table;

use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `contents` in one step.
///
/// Writes a temporary file next to the target and renames it over the
/// target, so readers never observe a partially written file.
pub(crate) fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
