//! Media attachment downloads
//!
//! Media URLs are discovered by scanning previously archived posts, then
//! fetched through the snapshot service and stored verbatim under the
//! attachments directory, one flat file per URL.

use crate::archive::require_username;
use crate::config::Config;
use crate::engine::{
    media_destination, ArchiveJob, FetchPlan, Fetcher, IdempotentSink, Materialized,
    ProgressEvent, ProgressSink, RunSummary, WorkItem, WorkerPool,
};
use crate::ArchiveError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Media host whose URLs are replayed through the snapshot service
pub const MEDIA_HOST_PREFIX: &str = "https://pbs.twimg.com/media/";

/// Rewrites a media URL to its snapshot replay URL
///
/// URLs on other hosts are returned unchanged.
pub fn media_snapshot_url(base_url: &str, url: &str) -> String {
    match url.strip_prefix(MEDIA_HOST_PREFIX) {
        Some(rest) => format!("{}/{}{}", base_url, MEDIA_HOST_PREFIX, rest),
        None => url.to_string(),
    }
}

/// Last path segment of a media URL, if it is usable as a file name
pub fn media_filename(url: &str) -> Option<&str> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

pub struct MediaJob {
    sink: IdempotentSink,
    base_url: String,
}

impl MediaJob {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            sink: IdempotentSink::new(root),
            base_url: base_url.to_string(),
        }
    }
}

impl ArchiveJob for MediaJob {
    fn kind(&self) -> &'static str {
        "media"
    }

    fn sink(&self) -> &IdempotentSink {
        &self.sink
    }

    fn plan(&self, item: &WorkItem) -> Result<FetchPlan, String> {
        let WorkItem::Media { url } = item else {
            return Err(format!("Not a media entry: {}", item.label()));
        };
        let filename = media_filename(url).ok_or_else(|| "Invalid filename".to_string())?;

        Ok(FetchPlan {
            snapshot_url: media_snapshot_url(&self.base_url, url),
            destination: Some(media_destination(self.sink.root(), filename)),
        })
    }

    fn materialize(
        &self,
        _item: &WorkItem,
        plan: &FetchPlan,
        body: &[u8],
    ) -> Result<Materialized, String> {
        let destination = plan
            .destination
            .clone()
            .ok_or_else(|| "Invalid filename".to_string())?;
        Ok(Materialized {
            destination,
            bytes: body.to_vec(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostDocument {
    #[serde(default)]
    data: Option<PostData>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Default, Deserialize)]
struct PostData {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<IncludedUser>,
    #[serde(default)]
    media: Vec<IncludedMedia>,
}

#[derive(Debug, Deserialize)]
struct IncludedUser {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncludedMedia {
    #[serde(default)]
    url: Option<String>,
}

impl PostDocument {
    fn is_authored_by(&self, username: &str) -> bool {
        self.includes
            .as_ref()
            .and_then(|includes| includes.users.first())
            .and_then(|user| user.username.as_deref())
            .is_some_and(|name| name.to_lowercase() == username.to_lowercase())
    }

    fn is_repost(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| data.text.contains("RT @"))
    }

    fn media_urls(self) -> Vec<String> {
        if self.is_repost() {
            return Vec::new();
        }
        self.includes
            .map(|includes| includes.media.into_iter().filter_map(|m| m.url).collect())
            .unwrap_or_default()
    }
}

/// Every `*.json` file under `dir`, sorted by file name at each level
fn post_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::warn!("Post directory {} does not exist", dir.display());
        return Vec::new();
    }

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Collects media URLs from archived posts authored by `username`
///
/// Reposts contribute nothing. Files that cannot be read or parsed are logged
/// and skipped.
pub fn collect_media_urls(
    tweets_dir: &Path,
    username: &str,
    progress: &dyn ProgressSink,
) -> Vec<String> {
    let files = post_files(tweets_dir);
    progress.emit(ProgressEvent::ScanningFiles {
        message: format!("Found {} post files to scan", files.len()),
    });

    let mut urls = Vec::new();
    let mut matched = 0usize;

    for (index, file) in files.iter().enumerate() {
        let document = match std::fs::read(file)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                serde_json::from_slice::<PostDocument>(&bytes).map_err(|e| e.to_string())
            }) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable post file");
                continue;
            }
        };

        if !document.is_authored_by(username) {
            continue;
        }
        matched += 1;
        urls.extend(document.media_urls());

        if (index + 1) % 100 == 0 {
            tracing::debug!("Scanned {}/{} files...", index + 1, files.len());
        }
    }

    progress.emit(ProgressEvent::ScanComplete {
        files: matched,
        total: urls.len(),
        message: format!("Total media found: {}", urls.len()),
    });
    urls
}

/// Scans archived posts for media and downloads it
pub async fn archive_media(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    username: &str,
    progress: &dyn ProgressSink,
) -> Result<RunSummary, ArchiveError> {
    let username = require_username(username)?;
    tracing::info!(username, "Processing media");

    let urls = collect_media_urls(&config.output.tweets_dir, username, progress);
    if urls.is_empty() {
        tracing::info!("No media found to download");
    }

    let items = urls.into_iter().map(|url| WorkItem::Media { url }).collect();
    let job = MediaJob::new(&config.output.attaches_dir, &config.wayback.base_url);
    WorkerPool::new(config.media.clone(), fetcher, job)
        .run(items, progress)
        .await
}
