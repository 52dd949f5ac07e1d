//! Progress events delivered to callers while a run is in flight
//!
//! Events serialize to JSON objects tagged by `stage`, with camelCase fields
//! (`totalSuccess`, `currentItem`, ...), which is the shape front-ends consume.

use crate::engine::aggregator::AggregateStats;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// A point-in-time report about a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// Work is about to be dispatched
    Initializing {
        total: usize,
        workers: usize,
        message: String,
    },

    /// Archived posts are being scanned for media
    ScanningFiles { message: String },

    /// Media scan finished
    ScanComplete {
        files: usize,
        total: usize,
        message: String,
    },

    /// One item reached a terminal outcome
    ItemUpdate {
        processed: usize,
        total: usize,
        worker_id: usize,
        current_item: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },

    /// A worker's batch was merged; `processed`/`total` count workers
    WorkerUpdate {
        worker_id: usize,
        processed: usize,
        total: usize,
        #[serde(flatten)]
        stats: AggregateStats,
    },

    /// A worker terminated abnormally
    WorkerError { worker_id: usize, error: String },

    /// Final counts
    Summary {
        message: String,
        #[serde(flatten)]
        stats: AggregateStats,
    },

    /// The run finished
    Complete { message: String },

    /// The run failed; counts cover what was merged before the failure
    Error {
        error: String,
        #[serde(flatten)]
        stats: AggregateStats,
    },
}

impl ProgressEvent {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Initializing { .. } => "initializing",
            Self::ScanningFiles { .. } => "scanning_files",
            Self::ScanComplete { .. } => "scan_complete",
            Self::ItemUpdate { .. } => "item_update",
            Self::WorkerUpdate { .. } => "worker_update",
            Self::WorkerError { .. } => "worker_error",
            Self::Summary { .. } => "summary",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<&'static str> {
        self.events().iter().map(ProgressEvent::stage).collect()
    }
}

impl ProgressSink for CollectingProgress {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Writes each event as a single JSON line
pub struct JsonLinesProgress<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressSink for JsonLinesProgress<W> {
    fn emit(&self, event: ProgressEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut out) = self.out.lock() {
            if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                tracing::debug!("Progress output closed");
            }
        }
    }
}

/// Reports events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Initializing { message, .. }
            | ProgressEvent::ScanningFiles { message }
            | ProgressEvent::ScanComplete { message, .. }
            | ProgressEvent::Complete { message } => tracing::info!("{}", message),
            ProgressEvent::ItemUpdate {
                processed,
                total,
                current_item,
                success: true,
                path,
                ..
            } => tracing::info!(
                "[{}/{}] {} -> {}",
                processed,
                total,
                current_item,
                path.map(|p| p.display().to_string()).unwrap_or_default()
            ),
            ProgressEvent::ItemUpdate {
                processed,
                total,
                current_item,
                error,
                ..
            } => tracing::warn!(
                "[{}/{}] {} failed: {}",
                processed,
                total,
                current_item,
                error.unwrap_or_default()
            ),
            ProgressEvent::WorkerUpdate {
                worker_id,
                processed,
                total,
                stats,
            } => tracing::info!(
                "Worker {} done ({}/{} workers): {}",
                worker_id,
                processed,
                total,
                stats
            ),
            ProgressEvent::WorkerError { worker_id, error } => {
                tracing::error!("Worker {} error: {}", worker_id, error)
            }
            ProgressEvent::Summary { message, .. } => tracing::info!("{}", message),
            ProgressEvent::Error { error, stats } => {
                tracing::error!("Run failed: {} ({})", error, stats)
            }
        }
    }
}
