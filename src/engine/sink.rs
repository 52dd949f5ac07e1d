//! Idempotent sink
//!
//! Maps items to deterministic destination paths and writes fetched bytes
//! there. A destination that already exists means the item is done; this is
//! what lets an interrupted run be restarted without re-fetching.
//!
//! Writes land in a temp file next to the destination and are then linked into
//! place without overwriting, so an existing file is always complete and the
//! first writer of a contested path wins.

use chrono::{DateTime, Datelike, Utc};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Result of a write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Bytes were written to the destination
    Written(PathBuf),

    /// Another writer materialized the destination first
    AlreadyPresent(PathBuf),
}

/// Persistence root for one kind of artifact
#[derive(Debug, Clone)]
pub struct IdempotentSink {
    root: PathBuf,
}

impl IdempotentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it is missing
    pub fn prepare(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Returns true if `destination` already holds a completed artifact
    pub fn exists(&self, destination: &Path) -> bool {
        destination.is_file()
    }

    /// Writes `bytes` to `destination`, creating parent directories on demand
    ///
    /// Never replaces an existing file.
    pub fn write(&self, destination: &Path, bytes: &[u8]) -> io::Result<WriteResult> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        if self.exists(destination) {
            return Ok(WriteResult::AlreadyPresent(destination.to_path_buf()));
        }

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        match temp.persist_noclobber(destination) {
            Ok(_) => Ok(WriteResult::Written(destination.to_path_buf())),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(WriteResult::AlreadyPresent(destination.to_path_buf()))
            }
            Err(e) => Err(e.error),
        }
    }
}

/// Destination of an archived post
///
/// `{root}/{YYYY}/{YYYY-MM}/{YYYY-MM-DD}/{id}_{owner}.json`, dated by the
/// snapshot timestamp.
pub fn post_destination(root: &Path, date: DateTime<Utc>, id: &str, owner: &str) -> PathBuf {
    let year = format!("{:04}", date.year());
    let month = format!("{}-{:02}", year, date.month());
    let day = format!("{}-{:02}", month, date.day());

    root.join(&year)
        .join(&month)
        .join(day)
        .join(format!("{}_{}.json", id, owner))
}

/// Destination of a media file: `{root}/{filename}`
pub fn media_destination(root: &Path, filename: &str) -> PathBuf {
    root.join(filename)
}
