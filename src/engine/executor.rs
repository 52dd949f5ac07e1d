//! Fetch executor
//!
//! Runs the fetch/classify/wait loop for a single item until the retry policy
//! reaches a terminal decision. Waits are `tokio::time::sleep` calls, so a
//! backing-off item only suspends the worker that owns it.

use crate::engine::fetcher::Fetcher;
use crate::engine::retry::{Classification, RetryDecision, RetryLedger, RetryPolicy, RetryReason};
use crate::state::ItemState;
use crate::ArchiveError;
use std::sync::Arc;

/// Terminal result of the fetch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// A 2xx body was accepted; the item is still in `Fetching`
    Accepted { value: T, attempts: u32 },

    /// The service answered 404
    NotFound { attempts: u32 },

    /// The retry budget ran out
    Failed { message: String, attempts: u32 },
}

/// Applies a [`RetryPolicy`] around a [`Fetcher`]
#[derive(Clone)]
pub struct FetchExecutor {
    fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
}

impl FetchExecutor {
    pub fn new(fetcher: Arc<dyn Fetcher>, policy: RetryPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Fetches `url` until a terminal decision is reached
    ///
    /// `accept` inspects each 2xx body; a rejected body counts as a
    /// transient failure. On `Accepted` the item is left in
    /// [`ItemState::Fetching`] so the caller can record the write result.
    ///
    /// # Errors
    ///
    /// Only an illegal state transition, which indicates a bug in the caller,
    /// is returned as an error.
    pub async fn execute<T, F>(
        &self,
        url: &str,
        state: &mut ItemState,
        mut accept: F,
    ) -> Result<Fetched<T>, ArchiveError>
    where
        F: FnMut(&[u8]) -> Result<T, String>,
    {
        let mut ledger = RetryLedger::default();
        let mut attempts = 0u32;

        loop {
            state.transition(ItemState::Fetching)?;
            attempts += 1;
            tracing::trace!(url, attempt = attempts, "Fetching snapshot");

            let classification = match self.fetcher.fetch(url).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    match accept(&response.body) {
                        Ok(value) => Classification::Success(value),
                        Err(message) => Classification::Transient { message },
                    }
                }
                Ok(response) => {
                    Classification::from_failed_status(response.status, response.retry_after)
                }
                Err(e) => Classification::Transient {
                    message: e.to_string(),
                },
            };

            match self.policy.decide(classification, &mut ledger) {
                RetryDecision::Complete(value) => {
                    return Ok(Fetched::Accepted { value, attempts });
                }
                RetryDecision::NotFound => {
                    state.transition(ItemState::NotFound)?;
                    tracing::debug!(url, "Snapshot not found");
                    return Ok(Fetched::NotFound { attempts });
                }
                RetryDecision::Retry { delay, reason } => {
                    match reason {
                        RetryReason::RateLimited => {
                            state.transition(ItemState::RateLimited)?;
                            tracing::warn!(
                                url,
                                wait_ms = delay.as_millis() as u64,
                                waits = ledger.rate_limit_waits,
                                "Rate limited, waiting before retry"
                            );
                        }
                        RetryReason::Transient => {
                            state.transition(ItemState::TransientError)?;
                            tracing::warn!(
                                url,
                                attempt = ledger.failed_attempts,
                                max_attempts = self.policy.max_attempts,
                                delay_ms = delay.as_millis() as u64,
                                "Fetch failed, retrying"
                            );
                        }
                    }
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp { message } => {
                    state.transition(ItemState::Error)?;
                    tracing::error!(url, attempts, error = %message, "Giving up on snapshot");
                    return Ok(Fetched::Failed { message, attempts });
                }
            }
        }
    }
}
