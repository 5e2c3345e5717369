//! Batch orchestrator: split -> batch -> extract (sequentially) -> concatenate.
//!
//! Batches run one at a time, never concurrently, so progress reports are
//! monotonic and the output keeps statement order. A failed batch is logged
//! and dropped; the run carries on with the next one.

use statement_core::{assign_ids, ExtractedTransaction, Transaction};
use statement_ingest::{batch_rows, split_statement, BatchSize};
use std::time::Duration;

use crate::extractor::{ExtractError, ExtractionRequest, Extractor};

/// A batch whose extraction call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub index: usize,
    pub rows: usize,
    pub error: String,
}

/// Bookkeeping for one run, alongside its transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rows_total: usize,
    pub batches: usize,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    /// Data rows whose batch was dropped
    pub fn rows_dropped(&self) -> usize {
        self.failures.iter().map(|f| f.rows).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub transactions: Vec<Transaction>,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub struct Orchestrator<E> {
    extractor: E,
    batch_size: BatchSize,
    batch_timeout: Option<Duration>,
}

impl<E: Extractor> Orchestrator<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            batch_size: BatchSize::default(),
            batch_timeout: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Treat a batch that has not answered within `timeout` as failed.
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Process a whole statement.
    ///
    /// `on_progress` receives `floor(100 * rows_before_batch / total_rows)`
    /// before each batch and a final 100. Input without data rows reports
    /// 100 straight away and makes no extraction calls.
    pub async fn run(
        &self,
        csv_text: &str,
        known_projects: &[String],
        mut on_progress: impl FnMut(u8),
    ) -> RunOutcome {
        let Some(lines) = split_statement(csv_text) else {
            log::info!("statement has no data rows");
            on_progress(100);
            return RunOutcome::default();
        };

        let total = lines.row_count();
        let batches = batch_rows(&lines.rows, self.batch_size);
        let mut report = RunReport {
            rows_total: total,
            batches: batches.len(),
            failures: Vec::new(),
        };
        let mut records: Vec<ExtractedTransaction> = Vec::new();

        for batch in &batches {
            on_progress(percent(batch.offset, total));

            let request = ExtractionRequest {
                header: &lines.header,
                rows: batch.rows,
                known_projects,
            };
            match self.extract_one(&request).await {
                Ok(mut out) => {
                    if out.len() != batch.rows.len() {
                        log::debug!(
                            "batch {} returned {} records for {} rows",
                            batch.index,
                            out.len(),
                            batch.rows.len()
                        );
                    }
                    records.append(&mut out);
                }
                Err(e) => {
                    log::warn!(
                        "batch {} (rows {}..{}) failed, skipping: {e}",
                        batch.index,
                        batch.offset,
                        batch.offset + batch.rows.len()
                    );
                    report.failures.push(BatchFailure {
                        index: batch.index,
                        rows: batch.rows.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        on_progress(100);
        log::info!(
            "extracted {} transactions from {} rows ({} of {} batches failed)",
            records.len(),
            total,
            report.failures.len(),
            report.batches
        );

        RunOutcome {
            transactions: assign_ids(records),
            report,
        }
    }

    async fn extract_one(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> Result<Vec<ExtractedTransaction>, ExtractError> {
        match self.batch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.extractor.extract(request))
                .await
                .map_err(|_| ExtractError::Timeout(limit))?,
            None => self.extractor.extract(request).await,
        }
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_floors() {
        assert_eq!(percent(0, 31), 0);
        assert_eq!(percent(15, 31), 48);
        assert_eq!(percent(30, 31), 96);
        assert_eq!(percent(2, 3), 66);
    }

    #[test]
    fn test_report_rows_dropped() {
        let report = RunReport {
            rows_total: 40,
            batches: 3,
            failures: vec![
                BatchFailure { index: 0, rows: 15, error: "x".into() },
                BatchFailure { index: 2, rows: 10, error: "y".into() },
            ],
        };
        assert_eq!(report.rows_dropped(), 25);
        assert!(!report.is_complete());
    }
}
