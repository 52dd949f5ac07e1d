//! Retry/backoff policy
//!
//! Pure decision logic: given how one fetch attempt was classified, decide
//! whether the item is finished, should be retried after a wait, or has run
//! out of attempts. No I/O happens here; the executor performs the waits.
//!
//! | Classification | Decision |
//! |----------------|----------|
//! | Success | Complete |
//! | HTTP 404 | NotFound, never retried |
//! | HTTP 429 | wait `Retry-After` (or the default delay), no attempt consumed |
//! | Other failure | consume an attempt; wait and retry, or give up when exhausted |
//!
//! Rate-limit waits are unbounded unless a cap is configured, so a service that
//! answers 429 forever stalls the worker holding that item.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How a single fetch attempt turned out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<T> {
    /// 2xx with a body the job accepted
    Success(T),

    /// HTTP 404
    NotFound,

    /// HTTP 429, with the server-requested wait if it sent one
    RateLimited { retry_after: Option<Duration> },

    /// Any other status, a transport error, or an unacceptable body
    Transient { message: String },
}

impl<T> Classification<T> {
    /// Classifies a non-success HTTP status
    ///
    /// 2xx statuses are not handled here; the caller must inspect the body
    /// before it can call an attempt successful.
    pub fn from_failed_status(status: u16, retry_after: Option<Duration>) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited { retry_after },
            _ => Self::Transient {
                message: format!("HTTP error! status: {}", status),
            },
        }
    }
}

/// Why the executor is about to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    Transient,
}

/// What to do after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision<T> {
    Complete(T),
    NotFound,
    Retry { delay: Duration, reason: RetryReason },
    GiveUp { message: String },
}

/// Per-item bookkeeping the policy updates as attempts accumulate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryLedger {
    /// Attempts that consumed a retry credit
    pub failed_attempts: u32,

    /// Rate-limit waits taken so far
    pub rate_limit_waits: u32,
}

/// Retry budget and delays for one kind of run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
    pub max_rate_limit_waits: Option<u32>,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            rate_limit_delay: config.rate_limit_delay(),
            max_rate_limit_waits: config.rate_limit_cap(),
        }
    }

    /// Decides the next step for an item and records the attempt in `ledger`
    pub fn decide<T>(
        &self,
        classification: Classification<T>,
        ledger: &mut RetryLedger,
    ) -> RetryDecision<T> {
        match classification {
            Classification::Success(value) => RetryDecision::Complete(value),
            Classification::NotFound => RetryDecision::NotFound,
            Classification::RateLimited { retry_after } => {
                ledger.rate_limit_waits += 1;
                if let Some(cap) = self.max_rate_limit_waits {
                    if ledger.rate_limit_waits > cap {
                        return RetryDecision::GiveUp {
                            message: format!("Still rate limited after {} waits", cap),
                        };
                    }
                }
                RetryDecision::Retry {
                    delay: retry_after.unwrap_or(self.rate_limit_delay),
                    reason: RetryReason::RateLimited,
                }
            }
            Classification::Transient { message } => {
                ledger.failed_attempts += 1;
                if ledger.failed_attempts >= self.max_attempts {
                    RetryDecision::GiveUp { message }
                } else {
                    RetryDecision::Retry {
                        delay: self.retry_delay,
                        reason: RetryReason::Transient,
                    }
                }
            }
        }
    }
}

/// Parses a `Retry-After` header value
///
/// Accepts delay-seconds (`"120"`) and HTTP dates
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield a zero wait.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
