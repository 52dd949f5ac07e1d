//! Archived post downloads
//!
//! Each list entry `[timestamp, originalUrl]` is replayed through the raw
//! (`id_`) snapshot endpoint and stored as pretty-printed JSON under the
//! date-partitioned post tree.

use crate::archive::{require_username, snapshot_list};
use crate::config::Config;
use crate::engine::{
    post_destination, ArchiveJob, FetchPlan, Fetcher, IdempotentSink, Materialized,
    ProgressSink, RunSummary, WorkItem, WorkerPool,
};
use crate::timestamp::parse_wayback_timestamp;
use crate::ArchiveError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// `{base}/{timestamp}id_/{original_url}`
pub fn post_snapshot_url(base_url: &str, timestamp: &str, original_url: &str) -> String {
    format!("{}/{}id_/{}", base_url, timestamp, original_url)
}

/// Extracts the numeric post id from a `/status/<id>` URL
pub fn status_id(original_url: &str) -> Option<String> {
    let url = Url::parse(original_url).ok()?;
    let mut segments = url.path_segments()?;

    while let Some(segment) = segments.next() {
        if segment == "status" || segment == "statuses" {
            return segments
                .next()
                .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
                .map(str::to_string);
        }
    }
    None
}

fn id_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Downloads posts for one account
///
/// Files are named `{id}_{owner}.json`, where `owner` is the account the run
/// was started for.
pub struct PostJob {
    sink: IdempotentSink,
    base_url: String,
    owner: String,
}

impl PostJob {
    pub fn new(root: impl Into<PathBuf>, base_url: &str, owner: &str) -> Self {
        Self {
            sink: IdempotentSink::new(root),
            base_url: base_url.to_string(),
            owner: owner.to_string(),
        }
    }
}

impl ArchiveJob for PostJob {
    fn kind(&self) -> &'static str {
        "posts"
    }

    fn sink(&self) -> &IdempotentSink {
        &self.sink
    }

    fn plan(&self, item: &WorkItem) -> Result<FetchPlan, String> {
        let WorkItem::Post {
            timestamp,
            original_url,
        } = item
        else {
            return Err(format!("Not a post entry: {}", item.label()));
        };

        let date = parse_wayback_timestamp(timestamp)
            .map_err(|e| format!("Error processing {}: {}", original_url, e))?;

        // Without an id in the URL the destination is only known after fetching
        let destination = status_id(original_url)
            .map(|id| post_destination(self.sink.root(), date, &id, &self.owner));

        Ok(FetchPlan {
            snapshot_url: post_snapshot_url(&self.base_url, timestamp, original_url),
            destination,
        })
    }

    fn materialize(
        &self,
        item: &WorkItem,
        plan: &FetchPlan,
        body: &[u8],
    ) -> Result<Materialized, String> {
        let WorkItem::Post {
            timestamp,
            original_url,
        } = item
        else {
            return Err(format!("Not a post entry: {}", item.label()));
        };

        let document: Value =
            serde_json::from_slice(body).map_err(|e| format!("Invalid JSON response: {}", e))?;

        let data = document.get("data");
        let id = data.and_then(|d| d.get("id")).and_then(id_field);
        let author_id = data.and_then(|d| d.get("author_id")).and_then(id_field);
        let (Some(id), Some(_)) = (id, author_id) else {
            return Err(format!("Invalid tweet data structure for {}", original_url));
        };

        let destination = match &plan.destination {
            Some(destination) => destination.clone(),
            None => {
                let date = parse_wayback_timestamp(timestamp).map_err(|e| e.to_string())?;
                post_destination(self.sink.root(), date, &id, &self.owner)
            }
        };

        let bytes = serde_json::to_vec_pretty(&document).map_err(|e| e.to_string())?;
        Ok(Materialized { destination, bytes })
    }
}

/// Downloads every post listed in `list_file`
///
/// # Errors
///
/// Fails on an empty username, an unreadable or invalid list file, or a worker
/// fault. Individual failed posts are only counted in the summary.
pub async fn archive_posts(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    list_file: &Path,
    username: &str,
    progress: &dyn ProgressSink,
) -> Result<RunSummary, ArchiveError> {
    let username = require_username(username)?;
    let items = snapshot_list::load_list(list_file)?;

    tracing::info!(
        username,
        items = items.len(),
        "Downloading posts from {}",
        list_file.display()
    );

    let job = PostJob::new(&config.output.tweets_dir, &config.wayback.base_url, username);
    WorkerPool::new(config.posts.clone(), fetcher, job)
        .run(items, progress)
        .await
}
