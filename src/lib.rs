//! Wayback-Archiver: replays Wayback Machine snapshots of a user's posts and media
//!
//! This crate fetches archived snapshots over HTTP with a fixed pool of workers,
//! retries transient failures, waits out rate limits, and persists each result
//! to a deterministic location on disk so that interrupted runs can be resumed
//! without re-fetching anything already materialized.

pub mod archive;
pub mod config;
pub mod engine;
pub mod output;
pub mod state;
pub mod timestamp;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-item failures never surface here; they are recorded as
/// [`engine::Outcome::Error`] values and counted in the run summary.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("List file error: {0}")]
    List(#[from] ListError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ItemState,
        to: state::ItemState,
    },

    #[error("Worker {worker_id} failed: {message} ({stats})")]
    WorkerFault {
        worker_id: usize,
        message: String,
        stats: engine::AggregateStats,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors reading or parsing a snapshot list file as a whole
///
/// Individual malformed entries are not errors; they become failed items.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("Failed to read list file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse list file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid list file format in {path}: expected an array of [timestamp, original] pairs")]
    NotAnArray { path: PathBuf },
}

/// Wayback timestamp errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Invalid timestamp format '{0}'. Expected YYYYMMDDHHMMSS")]
    Format(String),

    #[error("Timestamp '{0}' is not a valid calendar date")]
    OutOfRange(String),
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{AggregateStats, Outcome, ProgressEvent, ProgressSink, RunSummary};
pub use state::ItemState;
