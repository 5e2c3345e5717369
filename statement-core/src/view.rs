//! Dashboard view state: active grouping, applied filter and selection.
//!
//! Reset rules:
//! - switching the grouping clears the filter and the selection
//! - loading a new transaction list clears the filter and the selection
//! - changing the filter keeps the selection

use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::aggregate::{self, Filter, FilterOption, Grouping, Summary};
use crate::transaction::{Transaction, TransactionId};

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("{grouping} filter '{name}' matches nothing in this statement")]
    UnknownFilter { grouping: &'static str, name: String },

    #[error("no transaction with id {0}")]
    UnknownTransaction(TransactionId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub grouping: Grouping,
    pub filter: Filter,
    pub selected: BTreeSet<TransactionId>,
}

impl ViewState {
    pub fn set_grouping(&mut self, grouping: Grouping) {
        self.grouping = grouping;
        self.filter = Filter::ShowAll;
        self.selected.clear();
    }

    pub fn reset(&mut self) {
        self.filter = Filter::ShowAll;
        self.selected.clear();
    }
}

/// Everything the table view renders, recomputed from scratch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView<'a> {
    pub grouping: Grouping,
    pub filter: Filter,
    pub summary: Summary,
    pub options: Vec<FilterOption>,
    pub visible: Vec<&'a Transaction>,
    pub visible_total: f64,
    pub selected_count: usize,
    pub selected_total: f64,
    pub all_visible_selected: bool,
}

/// Owns one run's transactions together with the view state over them.
///
/// The transaction list is never mutated, only replaced.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    transactions: Vec<Transaction>,
    state: ViewState,
}

impl Dashboard {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            state: ViewState::default(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Swap in a new run's result; filter and selection do not carry over.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.state.reset();
    }

    pub fn set_grouping(&mut self, grouping: Grouping) {
        self.state.set_grouping(grouping);
    }

    /// Apply a concrete group filter. The name must be one of the current
    /// dimension's observed group keys.
    pub fn set_filter(&mut self, name: &str) -> Result<(), ViewError> {
        let grouping = self.state.grouping;
        if !self.transactions.iter().any(|t| grouping.key(t) == name) {
            return Err(ViewError::UnknownFilter {
                grouping: grouping.label(),
                name: name.to_string(),
            });
        }
        self.state.filter = Filter::Group(name.to_string());
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.state.filter = Filter::ShowAll;
    }

    /// Step through "show all" followed by the options in dropdown order.
    pub fn cycle_filter(&mut self, forward: bool) {
        let options = self.options();
        if options.is_empty() {
            self.state.filter = Filter::ShowAll;
            return;
        }
        // Position 0 is "show all", options follow.
        let current = match &self.state.filter {
            Filter::ShowAll => 0,
            Filter::Group(name) => options
                .iter()
                .position(|o| &o.name == name)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let len = options.len() + 1;
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.state.filter = match next {
            0 => Filter::ShowAll,
            i => Filter::Group(options[i - 1].name.clone()),
        };
    }

    pub fn toggle(&mut self, id: TransactionId) -> Result<(), ViewError> {
        if !self.transactions.iter().any(|t| t.id == id) {
            return Err(ViewError::UnknownTransaction(id));
        }
        if !self.state.selected.remove(&id) {
            self.state.selected.insert(id);
        }
        Ok(())
    }

    pub fn toggle_select_all(&mut self) {
        let visible = aggregate::filtered(&self.transactions, self.state.grouping, &self.state.filter);
        aggregate::toggle_select_all(&visible, &mut self.state.selected);
    }

    pub fn options(&self) -> Vec<FilterOption> {
        aggregate::filter_options(&self.transactions, self.state.grouping)
    }

    pub fn is_selected(&self, id: TransactionId) -> bool {
        self.state.selected.contains(&id)
    }

    pub fn snapshot(&self) -> DashboardView<'_> {
        let visible = aggregate::filtered(&self.transactions, self.state.grouping, &self.state.filter);
        let visible_total = aggregate::visible_total(&visible);
        let all_visible_selected = aggregate::is_all_visible_selected(&visible, &self.state.selected);
        DashboardView {
            grouping: self.state.grouping,
            filter: self.state.filter.clone(),
            summary: Summary::compute(&self.transactions),
            options: self.options(),
            visible,
            visible_total,
            selected_count: self.state.selected.len(),
            selected_total: aggregate::selected_total(&self.transactions, &self.state.selected),
            all_visible_selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{assign_ids, ExtractedTransaction};

    fn dashboard() -> Dashboard {
        Dashboard::new(assign_ids(vec![
            ExtractedTransaction::new("", "ACME 1 Alpha", "ACME", Some("Alpha".into()), 10.0),
            ExtractedTransaction::new("", "ACME 2", "ACME", None, 5.0),
            ExtractedTransaction::new("", "Globex 77 Alpha", "Globex", Some("Alpha".into()), 2.5),
        ]))
    }

    #[test]
    fn test_filter_change_keeps_selection() {
        let mut d = dashboard();
        d.toggle(TransactionId(1)).unwrap();
        let before = d.snapshot().selected_total;

        d.set_filter("Globex").unwrap();
        assert_eq!(d.snapshot().selected_total, before);
        d.clear_filter();
        assert_eq!(d.snapshot().selected_total, before);
    }

    #[test]
    fn test_grouping_change_resets_filter_and_selection() {
        let mut d = dashboard();
        d.set_filter("ACME").unwrap();
        d.toggle_select_all();
        assert_eq!(d.state().selected.len(), 2);

        d.set_grouping(Grouping::Project);
        assert_eq!(d.state().filter, Filter::ShowAll);
        assert!(d.state().selected.is_empty());
    }

    #[test]
    fn test_replace_transactions_resets_view() {
        let mut d = dashboard();
        d.set_filter("ACME").unwrap();
        d.toggle(TransactionId(0)).unwrap();
        d.replace_transactions(Vec::new());
        assert_eq!(d.state().filter, Filter::ShowAll);
        assert!(d.state().selected.is_empty());
        assert_eq!(d.snapshot().visible_total, 0.0);
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let mut d = dashboard();
        let err = d.set_filter("Alpha").unwrap_err();
        assert!(matches!(err, ViewError::UnknownFilter { .. }));
        assert_eq!(err.to_string(), "Supplier filter 'Alpha' matches nothing in this statement");
        assert_eq!(d.state().filter, Filter::ShowAll);

        d.set_grouping(Grouping::Project);
        d.set_filter("Alpha").unwrap();
        assert_eq!(d.snapshot().visible_total, 12.5);
    }

    #[test]
    fn test_select_all_under_filter() {
        let mut d = dashboard();
        d.set_grouping(Grouping::Project);
        d.set_filter("Unassigned").unwrap();
        d.toggle_select_all();

        let view = d.snapshot();
        assert!(view.all_visible_selected);
        assert_eq!(view.selected_count, 1);
        assert_eq!(view.selected_total, 5.0);

        d.clear_filter();
        assert!(!d.snapshot().all_visible_selected);
    }

    #[test]
    fn test_cycle_filter_wraps() {
        let mut d = dashboard();
        d.cycle_filter(true);
        assert_eq!(d.state().filter, Filter::Group("ACME".into()));
        d.cycle_filter(true);
        assert_eq!(d.state().filter, Filter::Group("Globex".into()));
        d.cycle_filter(true);
        assert_eq!(d.state().filter, Filter::ShowAll);
        d.cycle_filter(false);
        assert_eq!(d.state().filter, Filter::Group("Globex".into()));
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut d = dashboard();
        assert_eq!(
            d.toggle(TransactionId(42)),
            Err(ViewError::UnknownTransaction(TransactionId(42)))
        );
    }
}
