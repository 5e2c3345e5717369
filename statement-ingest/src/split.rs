//! Line and field splitting for bank statement CSV exports.
//!
//! This is not a general CSV reader: quotes only toggle whether a comma
//! separates fields, and there is no escaped-quote support. That covers the
//! exports banks actually produce.

use serde::{Deserialize, Serialize};

/// Header plus data rows of a statement, blank lines removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLines {
    pub header: String,
    pub rows: Vec<String>,
}

impl StatementLines {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Non-blank lines of `text`, trimmed, in order. Handles `\n` and `\r\n`.
pub fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Split raw statement text into header and data rows.
///
/// Returns `None` when there are fewer than two non-blank lines, i.e. no data
/// rows at all.
pub fn split_statement(text: &str) -> Option<StatementLines> {
    let mut lines = non_blank_lines(text);
    let header = lines.next()?.to_string();
    let rows: Vec<String> = lines.map(str::to_string).collect();
    if rows.is_empty() {
        return None;
    }
    Some(StatementLines { header, rows })
}

/// Split one line into trimmed fields.
///
/// `"` flips the in-quote flag and is dropped; `,` separates fields only
/// outside quotes.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for c in line.chars() {
        match c {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Every non-blank line of `text`, split into fields
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    non_blank_lines(text).map(split_fields).collect()
}
