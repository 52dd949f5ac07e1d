use crate::state::ItemState;
use std::fmt;
use std::path::PathBuf;

/// Label reported for list entries that are not `[timestamp, url]` pairs
pub const MALFORMED_LABEL: &str = "Invalid/Malformed item data";

/// One fetch target read from the input list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// An archived post: snapshot timestamp plus the URL originally captured
    Post {
        timestamp: String,
        original_url: String,
    },

    /// A media attachment URL
    Media { url: String },

    /// A list entry that could not be read as a work item, kept verbatim
    Malformed { raw: String },
}

impl WorkItem {
    /// Human-readable label used in progress events and logs
    pub fn label(&self) -> &str {
        match self {
            Self::Post { original_url, .. } => original_url,
            Self::Media { url } => url,
            Self::Malformed { .. } => MALFORMED_LABEL,
        }
    }
}

/// An ordered slice of the input list owned by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAssignment {
    pub worker_id: usize,
    pub items: Vec<WorkItem>,
}

impl ChunkAssignment {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Terminal result of processing one work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Snapshot fetched and written
    Success { destination: PathBuf },

    /// Destination already present; nothing written
    Skipped { destination: PathBuf },

    /// Snapshot service answered 404
    NotFound,

    /// Attempts exhausted or the item was unusable
    Error { message: String },
}

impl Outcome {
    /// Success and Skipped both count as successes in run summaries
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Skipped { .. })
    }

    pub fn destination(&self) -> Option<&PathBuf> {
        match self {
            Self::Success { destination } | Self::Skipped { destination } => Some(destination),
            Self::NotFound | Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::NotFound => Some("404 Not Found".to_string()),
            Self::Error { message } => Some(message.clone()),
            Self::Success { .. } | Self::Skipped { .. } => None,
        }
    }

    /// The terminal item state this outcome corresponds to
    pub fn state(&self) -> ItemState {
        match self {
            Self::Success { .. } => ItemState::Success,
            Self::Skipped { .. } => ItemState::Skipped,
            Self::NotFound => ItemState::NotFound,
            Self::Error { .. } => ItemState::Error,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { destination } => write!(f, "saved to {}", destination.display()),
            Self::Skipped { destination } => {
                write!(f, "already present at {}", destination.display())
            }
            Self::NotFound => f.write_str("not found"),
            Self::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Outcome of one item together with how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub label: String,
    pub outcome: Outcome,
    /// Fetch attempts made, rate-limited ones included
    pub attempts: u32,
}

/// Every report produced by one worker, in chunk order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeBatch {
    pub worker_id: usize,
    pub reports: Vec<ItemReport>,
}
