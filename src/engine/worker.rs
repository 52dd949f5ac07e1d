//! A single worker: owns one chunk and processes it strictly in order

use crate::engine::aggregator::ItemUpdate;
use crate::engine::executor::{FetchExecutor, Fetched};
use crate::engine::job::ArchiveJob;
use crate::engine::sink::WriteResult;
use crate::engine::types::{ChunkAssignment, ItemReport, Outcome, OutcomeBatch, WorkItem};
use crate::state::ItemState;
use crate::ArchiveError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

const MALFORMED_MESSAGE: &str = "Skipped invalid or malformed item in list file.";

pub struct Worker<J: ArchiveJob> {
    id: usize,
    job: Arc<J>,
    executor: FetchExecutor,
    pacing: Duration,
}

impl<J: ArchiveJob> Worker<J> {
    pub fn new(id: usize, job: Arc<J>, executor: FetchExecutor, pacing: Duration) -> Self {
        Self {
            id,
            job,
            executor,
            pacing,
        }
    }

    /// Processes every item of `assignment` and returns their outcomes
    ///
    /// Each outcome is also sent on `updates` as soon as it is known. An `Err`
    /// means the worker itself broke, not that an item failed.
    pub async fn run(
        self,
        assignment: ChunkAssignment,
        updates: UnboundedSender<ItemUpdate>,
    ) -> Result<OutcomeBatch, ArchiveError> {
        self.job.sink().prepare()?;

        tracing::debug!(
            worker_id = self.id,
            kind = self.job.kind(),
            items = assignment.len(),
            "Worker starting"
        );

        let mut reports = Vec::with_capacity(assignment.len());
        for item in &assignment.items {
            let report = self.process_item(item).await?;
            // The coordinator may have stopped listening after a sibling fault
            let _ = updates.send(ItemUpdate {
                worker_id: self.id,
                report: report.clone(),
            });
            reports.push(report);
        }

        Ok(OutcomeBatch {
            worker_id: self.id,
            reports,
        })
    }

    async fn process_item(&self, item: &WorkItem) -> Result<ItemReport, ArchiveError> {
        let mut state = ItemState::Pending;
        let report = self.resolve(item, &mut state).await?;

        let expected = report.outcome.state();
        if state != expected {
            return Err(ArchiveError::InvalidTransition {
                from: state,
                to: expected,
            });
        }
        Ok(report)
    }

    /// Drives `state` from `Pending` to a terminal state and reports the outcome
    async fn resolve(
        &self,
        item: &WorkItem,
        state: &mut ItemState,
    ) -> Result<ItemReport, ArchiveError> {
        let label = item.label().to_string();

        if let WorkItem::Malformed { raw } = item {
            tracing::warn!(worker_id = self.id, entry = %raw, "Malformed list entry");
            state.transition(ItemState::Error)?;
            let outcome = Outcome::Error {
                message: MALFORMED_MESSAGE.to_string(),
            };
            return Ok(report(label, outcome, 0));
        }

        let plan = match self.job.plan(item) {
            Ok(plan) => plan,
            Err(message) => {
                tracing::warn!(worker_id = self.id, item = %label, error = %message, "Cannot plan item");
                state.transition(ItemState::Error)?;
                return Ok(report(label, Outcome::Error { message }, 0));
            }
        };

        if let Some(destination) = &plan.destination {
            if self.job.sink().exists(destination) {
                state.transition(ItemState::Skipped)?;
                tracing::debug!(worker_id = self.id, path = %destination.display(), "Already archived");
                return Ok(report(
                    label,
                    Outcome::Skipped {
                        destination: destination.clone(),
                    },
                    0,
                ));
            }
        }

        let fetched = self
            .executor
            .execute(&plan.snapshot_url, state, |body| {
                self.job.materialize(item, &plan, body)
            })
            .await?;

        let (materialized, attempts) = match fetched {
            Fetched::Accepted { value, attempts } => (value, attempts),
            Fetched::NotFound { attempts } => return Ok(report(label, Outcome::NotFound, attempts)),
            Fetched::Failed { message, attempts } => {
                return Ok(report(
                    label,
                    Outcome::Error {
                        message: format!("Error processing {}: {}", item.label(), message),
                    },
                    attempts,
                ))
            }
        };

        let sink = self.job.sink().clone();
        let destination = materialized.destination.clone();
        let written = tokio::task::spawn_blocking(move || {
            sink.write(&materialized.destination, &materialized.bytes)
        })
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        .and_then(|result| result);

        let outcome = match written {
            Ok(WriteResult::Written(destination)) => {
                state.transition(ItemState::Success)?;
                tracing::debug!(worker_id = self.id, path = %destination.display(), "Saved");
                if !self.pacing.is_zero() {
                    tokio::time::sleep(self.pacing).await;
                }
                Outcome::Success { destination }
            }
            Ok(WriteResult::AlreadyPresent(destination)) => {
                state.transition(ItemState::Skipped)?;
                tracing::warn!(
                    worker_id = self.id,
                    item = %label,
                    path = %destination.display(),
                    "Destination written by another item first, keeping existing file"
                );
                Outcome::Skipped { destination }
            }
            Err(e) => {
                state.transition(ItemState::Error)?;
                tracing::error!(worker_id = self.id, path = %destination.display(), error = %e, "Write failed");
                Outcome::Error {
                    message: format!("Failed to write {}: {}", destination.display(), e),
                }
            }
        };

        Ok(report(label, outcome, attempts))
    }
}

fn report(label: String, outcome: Outcome, attempts: u32) -> ItemReport {
    ItemReport {
        label,
        outcome,
        attempts,
    }
}
