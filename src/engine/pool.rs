//! Worker pool coordinator
//!
//! Partitions the item list, runs one tokio task per non-empty chunk, and
//! merges each worker's batch as it completes. The coordinator returns as soon
//! as every worker has finished or the first worker fault is observed.

use crate::config::EngineConfig;
use crate::engine::aggregator::{Aggregator, RunSummary};
use crate::engine::executor::FetchExecutor;
use crate::engine::fetcher::Fetcher;
use crate::engine::job::ArchiveJob;
use crate::engine::partition::partition;
use crate::engine::progress::ProgressSink;
use crate::engine::retry::RetryPolicy;
use crate::engine::types::WorkItem;
use crate::engine::worker::Worker;
use crate::ArchiveError;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError};

/// Runs one [`ArchiveJob`] over a list of items with a fixed number of workers
pub struct WorkerPool<J: ArchiveJob> {
    config: EngineConfig,
    executor: FetchExecutor,
    job: Arc<J>,
}

impl<J: ArchiveJob> WorkerPool<J> {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>, job: J) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            executor: FetchExecutor::new(fetcher, policy),
            config,
            job: Arc::new(job),
        }
    }

    /// Processes every item and returns the run summary
    ///
    /// Per-item failures are counted in the summary. The returned error is
    /// reserved for worker faults, which carry the totals merged before the
    /// fault was observed.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        progress: &dyn ProgressSink,
    ) -> Result<RunSummary, ArchiveError> {
        let total = items.len();
        let assignments: Vec<_> = partition(items, self.config.workers)
            .into_iter()
            .filter(|assignment| !assignment.is_empty())
            .collect();

        tracing::info!(
            kind = self.job.kind(),
            items = total,
            workers = assignments.len(),
            "Starting run"
        );

        let mut aggregator = Aggregator::new(total, assignments.len(), progress);
        aggregator.start();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut abort_handles: Vec<AbortHandle> = Vec::with_capacity(assignments.len());
        let mut running = FuturesUnordered::new();

        for assignment in assignments {
            let worker_id = assignment.worker_id;
            let worker = Worker::new(
                worker_id,
                Arc::clone(&self.job),
                self.executor.clone(),
                self.config.success_pacing(),
            );
            let handle = tokio::spawn(worker.run(assignment, tx.clone()));
            abort_handles.push(handle.abort_handle());
            running.push(handle.map(move |joined| (worker_id, joined)));
        }
        drop(tx);

        loop {
            tokio::select! {
                biased;

                Some(update) = rx.recv() => aggregator.record_item(update),

                next = running.next() => {
                    let Some((worker_id, joined)) = next else {
                        break;
                    };

                    // Everything a finished worker sent is already queued
                    while let Ok(update) = rx.try_recv() {
                        aggregator.record_item(update);
                    }

                    match joined {
                        Ok(Ok(batch)) => aggregator.merge_batch(batch),
                        Ok(Err(e)) => {
                            return Err(self.fault(&mut aggregator, &abort_handles, worker_id, e.to_string()));
                        }
                        Err(e) => {
                            return Err(self.fault(&mut aggregator, &abort_handles, worker_id, join_failure(&e)));
                        }
                    }
                }
            }
        }

        let summary = aggregator.finish();
        tracing::info!(kind = self.job.kind(), "{}", summary);
        Ok(summary)
    }

    fn fault(
        &self,
        aggregator: &mut Aggregator<'_>,
        abort_handles: &[AbortHandle],
        worker_id: usize,
        message: String,
    ) -> ArchiveError {
        tracing::error!(worker_id, error = %message, "Worker failed, failing run");
        let stats = aggregator.fail(worker_id, &message);

        if self.config.abort_on_fault {
            for handle in abort_handles {
                handle.abort();
            }
        } else {
            tracing::warn!("Remaining workers keep running detached and may still write files");
        }

        ArchiveError::WorkerFault {
            worker_id,
            message,
            stats,
        }
    }
}

fn join_failure(e: &JoinError) -> String {
    if e.is_panic() {
        "worker panicked".to_string()
    } else {
        "worker was cancelled".to_string()
    }
}
