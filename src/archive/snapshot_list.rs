//! Snapshot list files
//!
//! A list file is the JSON array returned by the CDX search API: an optional
//! `["timestamp", "original"]` header row followed by `[timestamp, url]` pairs.

use crate::archive::require_username;
use crate::config::Config;
use crate::engine::WorkItem;
use crate::{ArchiveError, ConfigError, ListError};
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

/// `{list_dir}/list_{username}.json`
pub fn list_file_path(list_dir: &Path, username: &str) -> PathBuf {
    list_dir.join(format!("list_{}.json", username))
}

/// Builds the CDX query listing every captured URL under a user's profile
pub fn cdx_query_url(cdx_url: &str, username: &str) -> Result<Url, ArchiveError> {
    let mut url = Url::parse(cdx_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", cdx_url, e)))?;
    url.query_pairs_mut()
        .append_pair("url", &format!("twitter.com/{}*", username))
        .append_pair("output", "json")
        .append_pair("fl", "timestamp,original")
        .append_pair("collapse", "urlkey");
    Ok(url)
}

/// Queries the CDX API and saves the snapshot list for `username`
///
/// If the list file already exists it is returned untouched and no request is
/// made, so an earlier (possibly hand-edited) list is never overwritten.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the list file
/// * `Err(ArchiveError)` - Empty username, request failure, non-2xx status, or
///   a body that is not JSON
pub async fn generate_list(
    client: &Client,
    config: &Config,
    username: &str,
) -> Result<PathBuf, ArchiveError> {
    let username = require_username(username)?;
    let path = list_file_path(&config.output.list_dir, username);

    if path.exists() {
        tracing::info!(
            "List file {} already exists. Skipping generation.",
            path.display()
        );
        return Ok(path);
    }

    let url = cdx_query_url(&config.wayback.cdx_url, username)?;
    tracing::info!(username, "Generating snapshot list");
    tracing::debug!(url = %url, "Querying CDX API");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| ArchiveError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| ArchiveError::Http {
        url: url.to_string(),
        source,
    })?;
    let data: Value = serde_json::from_slice(&body)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, serde_json::to_string_pretty(&data)?).await?;

    tracing::info!(
        entries = data.as_array().map(Vec::len).unwrap_or(0),
        "List generated: {}",
        path.display()
    );
    Ok(path)
}

/// Reads and parses a list file
pub fn load_list(path: &Path) -> Result<Vec<WorkItem>, ListError> {
    let content = std::fs::read_to_string(path).map_err(|source| ListError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_list(path, &content)
}

/// Parses list file content into work items
///
/// Entries that are not a pair of strings become [`WorkItem::Malformed`]
/// rather than failing the whole list.
pub fn parse_list(path: &Path, content: &str) -> Result<Vec<WorkItem>, ListError> {
    let value: Value = serde_json::from_str(content).map_err(|source| ListError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(entries) = value else {
        return Err(ListError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    let has_header = matches!(
        entries.first(),
        Some(Value::Array(first)) if first.first().and_then(Value::as_str) == Some("timestamp")
    );

    Ok(entries
        .into_iter()
        .skip(usize::from(has_header))
        .map(work_item)
        .collect())
}

fn work_item(entry: Value) -> WorkItem {
    if let Value::Array(pair) = &entry {
        if let [Value::String(timestamp), Value::String(original_url)] = pair.as_slice() {
            return WorkItem::Post {
                timestamp: timestamp.clone(),
                original_url: original_url.clone(),
            };
        }
    }
    WorkItem::Malformed {
        raw: entry.to_string(),
    }
}
