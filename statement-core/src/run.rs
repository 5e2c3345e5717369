//! Run lifecycle: one upload-to-dashboard processing cycle

use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Done,
}

/// Transient state of the current run, as shown by a progress indicator
#[derive(Debug, Clone, Default)]
pub struct RunState {
    phase: RunPhase,
    progress: u8,
    transactions: Vec<Transaction>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_processing(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn begin(&mut self) {
        self.phase = RunPhase::Running;
        self.progress = 0;
    }

    /// Record a progress report. Values never go backwards within a run and
    /// are capped at 100.
    pub fn report(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// Finish the run; the new list replaces any previous result wholesale.
    pub fn finish(&mut self, transactions: Vec<Transaction>) {
        self.progress = 100;
        self.phase = RunPhase::Done;
        self.transactions = transactions;
    }

    /// Whole-run failure: back to idle with progress cleared. The previous
    /// result is kept.
    pub fn fail(&mut self) {
        self.phase = RunPhase::Idle;
        self.progress = 0;
    }

    /// Hand the finished list to the dashboard.
    pub fn take_transactions(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut run = RunState::new();
        run.begin();
        run.report(40);
        run.report(20);
        assert_eq!(run.progress(), 40);
        run.report(250);
        assert_eq!(run.progress(), 100);
    }

    #[test]
    fn test_begin_resets_progress() {
        let mut run = RunState::new();
        run.begin();
        run.finish(Vec::new());
        assert_eq!(run.phase(), RunPhase::Done);
        assert_eq!(run.progress(), 100);

        run.begin();
        assert!(run.is_processing());
        assert_eq!(run.progress(), 0);
    }

    #[test]
    fn test_fail_returns_to_idle() {
        let mut run = RunState::new();
        run.begin();
        run.report(60);
        run.fail();
        assert_eq!(run.phase(), RunPhase::Idle);
        assert!(!run.is_processing());
        assert_eq!(run.progress(), 0);
    }
}
