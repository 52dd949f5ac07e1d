use crate::engine::sink::IdempotentSink;
use crate::engine::types::WorkItem;
use std::path::PathBuf;

/// Where and how to fetch one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    /// Replay URL on the snapshot service
    pub snapshot_url: String,

    /// Destination, when it can be known before fetching
    pub destination: Option<PathBuf>,
}

/// A fetched body turned into the bytes to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub destination: PathBuf,
    pub bytes: Vec<u8>,
}

/// The item-specific half of a run: what to fetch and what to keep
///
/// Errors are plain messages; they become `Outcome::Error` for the item
/// (from [`plan`](ArchiveJob::plan)) or a retryable failure (from
/// [`materialize`](ArchiveJob::materialize)).
pub trait ArchiveJob: Send + Sync + 'static {
    /// Short name used in logs, e.g. `"posts"`
    fn kind(&self) -> &'static str;

    fn sink(&self) -> &IdempotentSink;

    fn plan(&self, item: &WorkItem) -> Result<FetchPlan, String>;

    /// Validates a successful body and decides what to write
    fn materialize(
        &self,
        item: &WorkItem,
        plan: &FetchPlan,
        body: &[u8],
    ) -> Result<Materialized, String>;
}
