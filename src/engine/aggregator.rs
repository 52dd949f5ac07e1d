//! Aggregator / progress reporter
//!
//! Owned by the coordinating task. Worker batches are merged one at a time as
//! they arrive, so the running totals never have more than one writer.

use crate::engine::progress::{ProgressEvent, ProgressSink};
use crate::engine::types::{ItemReport, Outcome, OutcomeBatch};
use serde::Serialize;
use std::fmt;

/// Running counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    #[serde(rename = "totalSuccess")]
    pub success: usize,
    #[serde(rename = "totalSkipped")]
    pub skipped: usize,
    #[serde(rename = "totalNotFound")]
    pub not_found: usize,
    #[serde(rename = "totalError")]
    pub error: usize,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    #[serde(rename = "workersCompleted")]
    pub workers_completed: usize,
}

impl AggregateStats {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { .. } => self.success += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Error { .. } => self.error += 1,
        }
    }

    /// Folds one completed worker's batch into the totals
    pub fn merge(&mut self, batch: &OutcomeBatch) {
        for report in &batch.reports {
            self.record(&report.outcome);
        }
        self.workers_completed += 1;
    }

    /// Items with a recorded outcome
    pub fn processed(&self) -> usize {
        self.success + self.skipped + self.not_found + self.error
    }

    /// Downloaded or already present
    pub fn successes(&self) -> usize {
        self.success + self.skipped
    }

    /// Not found or errored
    pub fn failures(&self) -> usize {
        self.not_found + self.error
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success: {}, skipped: {}, not found: {}, errors: {}",
            self.success, self.skipped, self.not_found, self.error
        )
    }
}

/// Final result of a run that completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// `Total: N, Successes: S, Failures: F`
    pub message: String,
    pub stats: AggregateStats,
}

impl RunSummary {
    pub fn from_stats(stats: AggregateStats) -> Self {
        let message = format!(
            "Total: {}, Successes: {}, Failures: {}",
            stats.total_items,
            stats.successes(),
            stats.failures()
        );
        Self { message, stats }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// An item outcome streamed from a worker as soon as it is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub worker_id: usize,
    pub report: ItemReport,
}

/// Merges worker results and narrates the run to a [`ProgressSink`]
pub struct Aggregator<'a> {
    stats: AggregateStats,
    items_reported: usize,
    workers_total: usize,
    progress: &'a dyn ProgressSink,
}

impl<'a> Aggregator<'a> {
    pub fn new(total_items: usize, workers_total: usize, progress: &'a dyn ProgressSink) -> Self {
        Self {
            stats: AggregateStats::new(total_items),
            items_reported: 0,
            workers_total,
            progress,
        }
    }

    /// Announces the run before any worker starts
    pub fn start(&self) {
        self.progress.emit(ProgressEvent::Initializing {
            total: self.stats.total_items,
            workers: self.workers_total,
            message: format!(
                "Processing {} items with {} workers",
                self.stats.total_items, self.workers_total
            ),
        });
    }

    /// Reports one finished item; totals change only on [`merge_batch`](Self::merge_batch)
    pub fn record_item(&mut self, update: ItemUpdate) {
        self.items_reported += 1;
        let outcome = &update.report.outcome;

        self.progress.emit(ProgressEvent::ItemUpdate {
            processed: self.items_reported,
            total: self.stats.total_items,
            worker_id: update.worker_id,
            current_item: update.report.label.clone(),
            success: outcome.is_success(),
            error: outcome.error_message(),
            path: outcome.destination().cloned(),
        });
    }

    pub fn merge_batch(&mut self, batch: OutcomeBatch) {
        let mut worker_stats = AggregateStats::default();
        worker_stats.merge(&batch);
        self.stats.merge(&batch);

        tracing::info!(
            worker_id = batch.worker_id,
            succeeded = worker_stats.successes(),
            not_found = worker_stats.not_found,
            failed = worker_stats.error,
            "Worker completed ({}/{} workers)",
            self.stats.workers_completed,
            self.workers_total
        );

        self.progress.emit(ProgressEvent::WorkerUpdate {
            worker_id: batch.worker_id,
            processed: self.stats.workers_completed,
            total: self.workers_total,
            stats: self.stats.clone(),
        });
    }

    /// Reports a fatal worker fault and returns the totals merged so far
    pub fn fail(&mut self, worker_id: usize, message: &str) -> AggregateStats {
        self.progress.emit(ProgressEvent::WorkerError {
            worker_id,
            error: message.to_string(),
        });
        self.progress.emit(ProgressEvent::Error {
            error: format!("Worker {} failed: {}", worker_id, message),
            stats: self.stats.clone(),
        });
        self.stats.clone()
    }

    /// Emits the closing events and produces the run summary
    pub fn finish(self) -> RunSummary {
        let summary = RunSummary::from_stats(self.stats);

        self.progress.emit(ProgressEvent::Summary {
            message: summary.message.clone(),
            stats: summary.stats.clone(),
        });
        self.progress.emit(ProgressEvent::Complete {
            message: format!("All downloads completed! {}", summary.message),
        });

        summary
    }
}
