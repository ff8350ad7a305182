//! Raw row extraction from profile files.
//!
//! Turns profile text into [`RawRow`]s without interpreting any field. Typed
//! parsing and validation happen in the profile builder.

use std::path::Path;

use tracing::debug;
use volprofile_core::{Error, Result, SourceConfig};

/// Field delimiter of profile files.
const DELIMITER: char = ',';

/// One data line, split into its text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source (the header is line 1).
    pub line: usize,
    /// Fields in column order, untrimmed.
    pub fields: Vec<String>,
}

impl RawRow {
    /// Build a row from string slices.
    pub fn new(line: usize, fields: &[&str]) -> Self {
        Self {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Read the profile file at `path`.
///
/// A missing file yields [`Error::SourceNotFound`] so the loader can tell it
/// apart from a file that exists but is malformed.
pub fn read_rows_from_path(path: &Path, config: &SourceConfig) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(Error::source_not_found(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let rows = read_rows_from_str(&text, config)?;
    debug!(path = %path.display(), rows = rows.len(), "read profile rows");
    Ok(rows)
}

/// Split profile text into rows after checking the header line.
pub fn read_rows_from_str(text: &str, config: &SourceConfig) -> Result<Vec<RawRow>> {
    let mut lines = text.lines();

    let header = lines
        .next()
        .ok_or_else(|| Error::format(format!("Missing header. Expected '{}'", config.header)))?;

    // Tolerate a UTF-8 BOM written by spreadsheet exports.
    let header = header.trim_start_matches('\u{feff}');
    if header != config.header {
        return Err(Error::format(format!(
            "Invalid header: {header}. Expected '{}'",
            config.header
        )));
    }

    let rows = lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| RawRow {
            // +2: enumerate is 0-based and the header occupied line 1.
            line: idx + 2,
            fields: split_fields(line),
        })
        .collect();

    Ok(rows)
}

/// Split on the delimiter, dropping trailing empty fields (`a,b,,` has two).
fn split_fields(line: &str) -> Vec<String> {
    let mut fields: Vec<String> = line.split(DELIMITER).map(str::to_string).collect();
    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}
