//! Statement file intake: type check before reading, then read as text

use anyhow::Context;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("please upload a valid CSV file (got {0})")]
    NotCsv(String),

    #[error("failed to read file: {0:#}")]
    Read(anyhow::Error),
}

/// Accept a file named `*.csv` (any case) or declared as `text/csv`.
pub fn check_statement_type(file_name: &str, mime: Option<&str>) -> Result<(), IngestError> {
    let by_mime = mime.is_some_and(|m| m.trim().eq_ignore_ascii_case(CSV_MIME));
    let by_ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if by_mime || by_ext {
        Ok(())
    } else {
        Err(IngestError::NotCsv(file_name.to_string()))
    }
}

/// Validate the file type, then read the whole statement into memory.
pub fn read_statement(path: &Path, mime: Option<&str>) -> Result<String, IngestError> {
    check_statement_type(&path.display().to_string(), mime)?;
    fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))
        .map_err(IngestError::Read)
}
