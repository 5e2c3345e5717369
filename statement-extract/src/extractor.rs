//! The extraction seam: one batch of raw rows in, transaction records out.
//!
//! Implementations must fail the whole call on any transport or parsing
//! problem instead of returning partial data for the batch.

use serde_json::Value;
use statement_core::ExtractedTransaction;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::rules::resolve_project;

/// One extraction call's input
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub header: &'a str,
    pub rows: &'a [String],
    pub known_projects: &'a [String],
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} error: {status} {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Turns a batch of statement rows into transaction records.
///
/// The record count need not match the row count.
pub trait Extractor {
    fn extract(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> impl Future<Output = Result<Vec<ExtractedTransaction>, ExtractError>> + Send;
}

impl<E: Extractor + Sync> Extractor for &E {
    fn extract(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> impl Future<Output = Result<Vec<ExtractedTransaction>, ExtractError>> + Send {
        (**self).extract(request)
    }
}

/// Parse a service reply into validated records.
///
/// Accepts a bare JSON array, optionally wrapped in a markdown code fence. An
/// empty reply means the service found nothing in the batch.
pub fn parse_response(
    text: &str,
    known_projects: &[String],
) -> Result<Vec<ExtractedTransaction>, ExtractError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractError::MalformedResponse(format!("not JSON: {e}")))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ExtractError::MalformedResponse(format!(
                "expected an array, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let rec: ExtractedTransaction = serde_json::from_value(item)
            .map_err(|e| ExtractError::MalformedResponse(format!("record {i}: {e}")))?;
        records.push(rec);
    }
    validate_records(records, known_projects)
}

/// Enforce the record contract: finite amounts made absolute, and a project
/// only when it is one of the known names found verbatim in the description.
pub fn validate_records(
    records: Vec<ExtractedTransaction>,
    known_projects: &[String],
) -> Result<Vec<ExtractedTransaction>, ExtractError> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, mut rec)| {
            if !rec.amount.is_finite() {
                return Err(ExtractError::MalformedResponse(format!(
                    "record {i}: amount is not a finite number"
                )));
            }
            rec.amount = rec.amount.abs();
            rec.supplier = rec.supplier.trim().to_string();
            rec.project = resolve_project(rec.project.as_deref(), &rec.original_description, known_projects);
            Ok(rec)
        })
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
