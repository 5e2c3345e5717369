//! Deterministic extraction rules.
//!
//! `RuleExtractor` interprets rows offline with header heuristics instead of
//! calling a model. The helpers here also back the validation of model
//! output (project matching).

use regex::Regex;
use statement_core::ExtractedTransaction;
use statement_ingest::split_fields;
use std::sync::OnceLock;

use crate::extractor::{ExtractError, ExtractionRequest, Extractor};

/// An id-like run inside a token: optional `*`/`#` marker followed by a digit
fn id_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[*#]?\d").expect("static regex"))
}

/// First configured project name contained verbatim (case-sensitive) in the
/// description.
pub fn match_project(description: &str, known_projects: &[String]) -> Option<String> {
    known_projects
        .iter()
        .find(|p| !p.is_empty() && description.contains(p.as_str()))
        .cloned()
}

/// Keep a claimed project only if it is a known name present in the
/// description; otherwise fall back to direct matching.
pub fn resolve_project(
    claimed: Option<&str>,
    description: &str,
    known_projects: &[String],
) -> Option<String> {
    match claimed {
        Some(p) if !p.is_empty() && known_projects.iter().any(|k| k == p) && description.contains(p) => {
            Some(p.to_string())
        }
        Some(p) if !p.is_empty() => {
            log::debug!("discarding unmatched project '{p}' for '{description}'");
            match_project(description, known_projects)
        }
        _ => match_project(description, known_projects),
    }
}

/// Supplier name from a raw description: everything before the first
/// store number, invoice id or similar numeric suffix.
///
/// "AMZN Mktp US*13423" -> "AMZN Mktp US", "Starbucks Store #222" ->
/// "Starbucks Store". A leading token with digits ("7-ELEVEN") is kept.
pub fn clean_supplier(description: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for (i, token) in description.split_whitespace().enumerate() {
        match id_marker().find(token) {
            Some(m) if m.start() > 0 => {
                kept.push(&token[..m.start()]);
                break;
            }
            Some(_) if i > 0 => break,
            _ => kept.push(token),
        }
    }

    let name = kept
        .join(" ")
        .trim_end_matches(|c: char| c.is_whitespace() || "-*#:/.,".contains(c))
        .to_string();
    if name.is_empty() {
        description.trim().to_string()
    } else {
        name
    }
}

/// Parse a statement amount as an absolute value. Currency symbols,
/// thousands separators and accounting parentheses are ignored.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    let cleaned: String = t
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let v: f64 = cleaned.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(v.abs())
}

/// Column positions found in a statement header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    pub date: Option<usize>,
    pub description: Option<usize>,
    /// Spend column: debit preferred, then a generic amount, then credit
    pub amount: Option<usize>,
}

impl Columns {
    pub fn detect(header: &str) -> Self {
        let names: Vec<String> = split_fields(header)
            .into_iter()
            .map(|h| h.to_lowercase())
            .collect();
        let find = |keys: &[&str]| names.iter().position(|h| keys.iter().any(|k| h.contains(k)));

        let amount = find(&["debit"])
            .or_else(|| find(&["amount"]))
            .or_else(|| find(&["credit"]));

        Self {
            date: find(&["date"]),
            description: find(&["description", "details", "narrative", "memo", "payee", "merchant"]),
            amount,
        }
    }
}

/// Offline extractor built from the rules above
#[derive(Debug, Clone, Default)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Rows whose spend column is empty or not numeric are skipped.
    pub fn extract_rows(
        &self,
        header: &str,
        rows: &[String],
        known_projects: &[String],
    ) -> Vec<ExtractedTransaction> {
        let cols = Columns::detect(header);

        rows.iter()
            .filter_map(|row| {
                let fields = split_fields(row);
                let get = |i: Option<usize>| i.and_then(|i| fields.get(i)).map(String::as_str);

                let Some(amount) = get(cols.amount).and_then(parse_amount) else {
                    log::debug!("no spend amount in row, skipping: {row}");
                    return None;
                };
                let description = get(cols.description)
                    .filter(|d| !d.is_empty())
                    .unwrap_or(row.as_str())
                    .to_string();

                Some(ExtractedTransaction {
                    date: get(cols.date).unwrap_or("").to_string(),
                    supplier: clean_supplier(&description),
                    project: match_project(&description, known_projects),
                    original_description: description,
                    amount,
                })
            })
            .collect()
    }
}

impl Extractor for RuleExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> Result<Vec<ExtractedTransaction>, ExtractError> {
        Ok(self.extract_rows(request.header, request.rows, request.known_projects))
    }
}
