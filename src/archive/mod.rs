//! Archive jobs built on the download engine
//!
//! - `snapshot_list`: CDX list generation and list file parsing
//! - `posts`: replaying archived posts into the dated post tree
//! - `media`: discovering and downloading media referenced by those posts

pub mod media;
pub mod posts;
pub mod snapshot_list;

pub use media::{archive_media, collect_media_urls, media_filename, media_snapshot_url, MediaJob};
pub use posts::{archive_posts, post_snapshot_url, status_id, PostJob};
pub use snapshot_list::{cdx_query_url, generate_list, list_file_path, load_list, parse_list};

use crate::ArchiveError;

/// Rejects blank usernames
pub(crate) fn require_username(username: &str) -> Result<&str, ArchiveError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ArchiveError::EmptyUsername);
    }
    Ok(username)
}
