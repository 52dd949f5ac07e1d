//! Download engine
//!
//! A fixed pool of workers fetches snapshot items in parallel. Each worker owns
//! one contiguous chunk of the input list and processes it in order:
//!
//! 1. Skip the item if its destination already exists
//! 2. Fetch, retrying transient failures and waiting out rate limits
//! 3. Write the result atomically to its destination
//!
//! Item outcomes stream to a [`ProgressSink`] as they happen; worker batches
//! are merged into [`AggregateStats`] by the coordinating task.

mod aggregator;
mod executor;
mod fetcher;
mod job;
mod partition;
mod pool;
mod progress;
mod retry;
mod sink;
mod types;
mod worker;

#[cfg(test)]
mod testing;

pub use aggregator::{AggregateStats, Aggregator, ItemUpdate, RunSummary};
pub use executor::{FetchExecutor, Fetched};
pub use fetcher::{
    build_http_client, FailureKind, FetchError, FetchResponse, Fetcher, ReqwestFetcher,
};
pub use job::{ArchiveJob, FetchPlan, Materialized};
pub use partition::{chunk_ranges, partition};
pub use pool::WorkerPool;
pub use progress::{
    ChannelProgressSink, CollectingProgress, JsonLinesProgress, LogProgress, NoopProgress,
    ProgressEvent, ProgressSink,
};
pub use retry::{
    parse_retry_after, Classification, RetryDecision, RetryLedger, RetryPolicy, RetryReason,
};
pub use sink::{media_destination, post_destination, IdempotentSink, WriteResult};
pub use types::{
    ChunkAssignment, ItemReport, Outcome, OutcomeBatch, WorkItem, MALFORMED_LABEL,
};
pub use worker::Worker;
