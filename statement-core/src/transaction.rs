//! Transaction record types shared by the extraction pipeline and the dashboard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Group key used when a transaction has no supplier name
pub const UNKNOWN_SUPPLIER: &str = "Unknown";
/// Group key used when a transaction matched no configured project
pub const UNASSIGNED_PROJECT: &str = "Unassigned";

/// Stable identity of a transaction within one run.
///
/// Assigned sequentially by the orchestrator when the final list is built;
/// selection state is keyed by this, never by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record as returned by an extraction adapter, before it is given an id.
///
/// The serde shape is the JSON contract expected from the extraction service:
/// `originalDescription`, `supplier` and `amount` are required, `date` and
/// `project` may be missing or null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTransaction {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    pub original_description: String,
    pub supplier: String,
    #[serde(default)]
    pub project: Option<String>,
    pub amount: f64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExtractedTransaction {
    pub fn new(
        date: impl Into<String>,
        original_description: impl Into<String>,
        supplier: impl Into<String>,
        project: Option<String>,
        amount: f64,
    ) -> Self {
        Self {
            date: date.into(),
            original_description: original_description.into(),
            supplier: supplier.into(),
            project,
            amount,
        }
    }
}

/// One interpreted statement row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// Opaque date text, possibly empty
    pub date: String,
    /// Verbatim source description
    pub original_description: String,
    pub supplier: String,
    /// One of the configured project names, or none
    pub project: Option<String>,
    /// Absolute spend amount
    pub amount: f64,
}

impl Transaction {
    pub fn from_extracted(id: TransactionId, record: ExtractedTransaction) -> Self {
        Self {
            id,
            date: record.date,
            original_description: record.original_description,
            supplier: record.supplier,
            project: record.project,
            amount: record.amount,
        }
    }

    /// Supplier group key ("Unknown" when empty)
    pub fn supplier_key(&self) -> &str {
        if self.supplier.is_empty() {
            UNKNOWN_SUPPLIER
        } else {
            &self.supplier
        }
    }

    /// Project group key ("Unassigned" when none)
    pub fn project_key(&self) -> &str {
        match self.project.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => UNASSIGNED_PROJECT,
        }
    }
}

/// Number the records of a finished run in order.
pub fn assign_ids(records: Vec<ExtractedTransaction>) -> Vec<Transaction> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| Transaction::from_extracted(TransactionId(i as u64), r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{"originalDescription":"STARBUCKS #222","supplier":"Starbucks","amount":4.5}"#;
        let rec: ExtractedTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(rec.date, "");
        assert_eq!(rec.project, None);
        assert_eq!(rec.amount, 4.5);
    }

    #[test]
    fn test_deserialize_null_date_and_project() {
        let json = r#"{"date":null,"originalDescription":"X","supplier":"X","project":null,"amount":1}"#;
        let rec: ExtractedTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(rec.date, "");
        assert!(rec.project.is_none());
    }

    #[test]
    fn test_missing_supplier_is_rejected() {
        let json = r#"{"originalDescription":"X","amount":1}"#;
        assert!(serde_json::from_str::<ExtractedTransaction>(json).is_err());
    }

    #[test]
    fn test_group_keys_default() {
        let t = Transaction::from_extracted(
            TransactionId(0),
            ExtractedTransaction::new("", "desc", "", None, 3.0),
        );
        assert_eq!(t.supplier_key(), UNKNOWN_SUPPLIER);
        assert_eq!(t.project_key(), UNASSIGNED_PROJECT);
    }

    #[test]
    fn test_assign_ids_keeps_duplicates_distinct() {
        let rec = ExtractedTransaction::new("2024-01-01", "COFFEE", "Coffee", None, 2.0);
        let txns = assign_ids(vec![rec.clone(), rec]);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].id, TransactionId(0));
        assert_eq!(txns[1].id, TransactionId(1));
        assert_eq!(txns[0].original_description, txns[1].original_description);
    }
}
