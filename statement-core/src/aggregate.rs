//! Aggregation engine: totals, grouped sums, filter options and selection
//! totals over a transaction list.
//!
//! Everything here is a pure function of the transaction list and the view
//! inputs (grouping, filter, selection). Callers recompute on every change
//! instead of caching.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::transaction::{Transaction, TransactionId, UNASSIGNED_PROJECT};

/// The attribute transactions are bucketed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    #[default]
    Supplier,
    Project,
}

impl Grouping {
    /// Group key of a transaction under this dimension
    pub fn key<'a>(&self, txn: &'a Transaction) -> &'a str {
        match self {
            Grouping::Supplier => txn.supplier_key(),
            Grouping::Project => txn.project_key(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grouping::Supplier => "Supplier",
            Grouping::Project => "Project",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Grouping::Supplier => Grouping::Project,
            Grouping::Project => Grouping::Supplier,
        }
    }
}

/// Either "show all" or one concrete group name of the active dimension
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    ShowAll,
    Group(String),
}

impl Filter {
    pub fn matches(&self, grouping: Grouping, txn: &Transaction) -> bool {
        match self {
            Filter::ShowAll => true,
            Filter::Group(name) => grouping.key(txn) == name,
        }
    }

    pub fn is_show_all(&self) -> bool {
        matches!(self, Filter::ShowAll)
    }
}

/// One entry of the filter dropdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub name: String,
    pub amount: f64,
    pub count: usize,
}

pub fn total(txns: &[Transaction]) -> f64 {
    txns.iter().map(|t| t.amount).sum()
}

/// Sum of amounts per group key
pub fn grouped_sums(txns: &[Transaction], grouping: Grouping) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for t in txns {
        *sums.entry(grouping.key(t).to_string()).or_insert(0.0) += t.amount;
    }
    sums
}

/// Filter options sorted by summed amount, highest first. Ties fall back to
/// name order so the list is deterministic for a given input.
pub fn filter_options(txns: &[Transaction], grouping: Grouping) -> Vec<FilterOption> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for t in txns {
        let entry = groups.entry(grouping.key(t)).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut options: Vec<FilterOption> = groups
        .into_iter()
        .map(|(name, (amount, count))| FilterOption {
            name: name.to_string(),
            amount,
            count,
        })
        .collect();

    options.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    options
}

/// Transactions visible under the filter, in list order
pub fn filtered<'a>(
    txns: &'a [Transaction],
    grouping: Grouping,
    filter: &Filter,
) -> Vec<&'a Transaction> {
    txns.iter().filter(|t| filter.matches(grouping, t)).collect()
}

pub fn visible_total(visible: &[&Transaction]) -> f64 {
    visible.iter().map(|t| t.amount).sum()
}

/// Sum over every selected transaction of the full list, whatever the filter
pub fn selected_total(txns: &[Transaction], selected: &BTreeSet<TransactionId>) -> f64 {
    txns.iter()
        .filter(|t| selected.contains(&t.id))
        .map(|t| t.amount)
        .sum()
}

pub fn is_all_visible_selected(visible: &[&Transaction], selected: &BTreeSet<TransactionId>) -> bool {
    !visible.is_empty() && visible.iter().all(|t| selected.contains(&t.id))
}

/// Select-all checkbox: clears the visible ids when they are all selected,
/// otherwise adds them. Ids outside the filter are left alone.
pub fn toggle_select_all(visible: &[&Transaction], selected: &mut BTreeSet<TransactionId>) {
    if is_all_visible_selected(visible, selected) {
        for t in visible {
            selected.remove(&t.id);
        }
    } else {
        selected.extend(visible.iter().map(|t| t.id));
    }
}

/// Dashboard header figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: f64,
    pub by_supplier: BTreeMap<String, f64>,
    pub by_project: BTreeMap<String, f64>,
}

impl Summary {
    pub fn compute(txns: &[Transaction]) -> Self {
        Self {
            total: total(txns),
            by_supplier: grouped_sums(txns, Grouping::Supplier),
            by_project: grouped_sums(txns, Grouping::Project),
        }
    }

    pub fn sums(&self, grouping: Grouping) -> &BTreeMap<String, f64> {
        match grouping {
            Grouping::Supplier => &self.by_supplier,
            Grouping::Project => &self.by_project,
        }
    }

    pub fn unique_suppliers(&self) -> usize {
        self.by_supplier.len()
    }

    /// Projects that received at least one transaction
    pub fn active_projects(&self) -> usize {
        self.by_project
            .keys()
            .filter(|k| k.as_str() != UNASSIGNED_PROJECT)
            .count()
    }
}
