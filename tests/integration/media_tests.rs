use crate::{create_test_config, fetcher};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wayback_archiver::archive::archive_media;
use wayback_archiver::engine::CollectingProgress;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_post(tweets_dir: &Path, name: &str, username: &str, text: &str, media: &[&str]) {
    let day_dir = tweets_dir.join("2023/2023-06/2023-06-15");
    std::fs::create_dir_all(&day_dir).unwrap();
    let document = json!({
        "data": {"id": name, "author_id": "42", "text": text},
        "includes": {
            "users": [{"username": username}],
            "media": media.iter().map(|url| json!({"url": url})).collect::<Vec<_>>()
        }
    });
    std::fs::write(
        day_dir.join(format!("{}_{}.json", name, username)),
        document.to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_existing_media_is_skipped_without_fetching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/web/https://pbs\.twimg\.com/media/[a-d]\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    write_post(
        &config.output.tweets_dir,
        "1",
        "alice",
        "photos",
        &[
            "https://pbs.twimg.com/media/a.jpg",
            "https://pbs.twimg.com/media/b.jpg",
        ],
    );
    write_post(
        &config.output.tweets_dir,
        "2",
        "alice",
        "more photos",
        &[
            "https://pbs.twimg.com/media/c.jpg",
            "https://pbs.twimg.com/media/d.jpg",
        ],
    );

    std::fs::create_dir_all(&config.output.attaches_dir).unwrap();
    std::fs::write(config.output.attaches_dir.join("a.jpg"), b"old-a").unwrap();
    std::fs::write(config.output.attaches_dir.join("c.jpg"), b"old-c").unwrap();

    let progress = CollectingProgress::new();
    let summary = archive_media(&config, fetcher(&config), "alice", &progress)
        .await
        .expect("Run should complete");

    assert_eq!(summary.stats.total_items, 4);
    assert_eq!(summary.stats.skipped, 2);
    assert_eq!(summary.stats.success, 2);
    assert_eq!(summary.message, "Total: 4, Successes: 4, Failures: 0");

    assert_eq!(
        std::fs::read(config.output.attaches_dir.join("a.jpg")).unwrap(),
        b"old-a"
    );
    assert_eq!(
        std::fs::read(config.output.attaches_dir.join("b.jpg")).unwrap(),
        b"jpeg-bytes"
    );

    let stages = progress.stages();
    assert_eq!(&stages[..3], &["scanning_files", "scan_complete", "initializing"]);
    assert_eq!(stages.last(), Some(&"complete"));
}

#[tokio::test]
async fn test_only_own_non_repost_media_is_downloaded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/media/own\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"own".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    write_post(
        &config.output.tweets_dir,
        "1",
        "Alice",
        "mine",
        &["https://pbs.twimg.com/media/own.jpg"],
    );
    write_post(
        &config.output.tweets_dir,
        "2",
        "alice",
        "RT @bob: nice",
        &["https://pbs.twimg.com/media/repost.jpg"],
    );
    write_post(
        &config.output.tweets_dir,
        "3",
        "bob",
        "bob's",
        &["https://pbs.twimg.com/media/bob.jpg"],
    );

    let summary = archive_media(&config, fetcher(&config), "alice", &CollectingProgress::new())
        .await
        .unwrap();

    assert_eq!(summary.stats.total_items, 1);
    assert_eq!(summary.stats.success, 1);
    assert!(config.output.attaches_dir.join("own.jpg").is_file());
}

#[tokio::test]
async fn test_media_not_found_counts_as_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    write_post(
        &config.output.tweets_dir,
        "1",
        "alice",
        "gone",
        &["https://pbs.twimg.com/media/gone.jpg"],
    );

    let summary = archive_media(&config, fetcher(&config), "alice", &CollectingProgress::new())
        .await
        .unwrap();

    assert_eq!(summary.stats.not_found, 1);
    assert_eq!(summary.message, "Total: 1, Successes: 0, Failures: 1");
    assert!(!config.output.attaches_dir.join("gone.jpg").exists());
}

#[tokio::test]
async fn test_no_media_completes_with_zero_items() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    write_post(&config.output.tweets_dir, "1", "alice", "text only", &[]);

    let summary = archive_media(&config, fetcher(&config), "alice", &CollectingProgress::new())
        .await
        .unwrap();

    assert_eq!(summary.message, "Total: 0, Successes: 0, Failures: 0");
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
