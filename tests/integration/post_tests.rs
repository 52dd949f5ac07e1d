use crate::{create_test_config, fetcher};
use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wayback_archiver::archive::archive_posts;
use wayback_archiver::engine::{CollectingProgress, NoopProgress, ProgressEvent};
use wayback_archiver::ArchiveError;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_body(id: &str) -> serde_json::Value {
    json!({
        "data": {"id": id, "author_id": "42", "text": "hello"},
        "includes": {"users": [{"username": "alice"}]}
    })
}

fn write_list(dir: &Path, entries: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("list_alice.json");
    std::fs::write(&path, entries.to_string()).unwrap();
    path
}

fn status_entries(count: usize) -> Vec<serde_json::Value> {
    (1..=count)
        .map(|id| {
            json!([
                "20230615120000",
                format!("https://twitter.com/alice/status/{}", id)
            ])
        })
        .collect()
}

#[tokio::test]
async fn test_ten_posts_two_workers_all_succeed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/web/20230615120000id_/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_body("1")))
        .expect(10)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut entries = vec![json!(["timestamp", "original"])];
    entries.extend(status_entries(10));
    let list = write_list(dir.path(), json!(entries));

    let progress = CollectingProgress::new();
    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &progress)
        .await
        .expect("Run should complete");

    assert_eq!(summary.message, "Total: 10, Successes: 10, Failures: 0");
    assert_eq!(summary.stats.workers_completed, 2);

    let day_dir = dir.path().join("tweets/2023/2023-06/2023-06-15");
    for id in 1..=10 {
        let file = day_dir.join(format!("{}_alice.json", id));
        assert!(file.is_file(), "missing {}", file.display());
    }

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(day_dir.join("3_alice.json")).unwrap()).unwrap();
    assert_eq!(stored["data"]["author_id"], "42");

    let worker_updates = progress
        .events()
        .into_iter()
        .filter(|event| matches!(event, ProgressEvent::WorkerUpdate { .. }))
        .count();
    assert_eq!(worker_updates, 2);
}

#[tokio::test]
async fn test_rerun_skips_existing_posts_without_fetching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_body("1")))
        .expect(4)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let list = write_list(dir.path(), json!(status_entries(4)));

    let first = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress)
        .await
        .unwrap();
    assert_eq!(first.stats.success, 4);

    let second = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress)
        .await
        .unwrap();
    assert_eq!(second.stats.skipped, 4);
    assert_eq!(second.stats.success, 0);
    assert_eq!(second.message, "Total: 4, Successes: 4, Failures: 0");
}

#[tokio::test]
async fn test_malformed_entry_is_counted_not_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_body("1")))
        .expect(4)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut entries = status_entries(4);
    entries.insert(2, json!(["bad"]));
    let list = write_list(dir.path(), json!(entries));

    let progress = CollectingProgress::new();
    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &progress)
        .await
        .expect("Malformed entries must not fail the run");

    assert_eq!(summary.stats.processed(), 5);
    assert_eq!(summary.stats.failures(), 1);
    assert_eq!(summary.message, "Total: 5, Successes: 4, Failures: 1");

    let malformed = progress.events().into_iter().find_map(|event| match event {
        ProgressEvent::ItemUpdate {
            current_item,
            error,
            success: false,
            ..
        } => Some((current_item, error)),
        _ => None,
    });
    assert_eq!(
        malformed,
        Some((
            "Invalid/Malformed item data".to_string(),
            Some("Skipped invalid or malformed item in list file.".to_string())
        ))
    );
}

#[tokio::test]
async fn test_not_found_is_attempted_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let list = write_list(dir.path(), json!(status_entries(1)));

    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress)
        .await
        .unwrap();

    assert_eq!(summary.stats.not_found, 1);
    assert_eq!(summary.stats.error, 0);
    assert_eq!(summary.message, "Total: 1, Successes: 0, Failures: 1");
}

#[tokio::test]
async fn test_transient_failures_use_whole_budget() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let list = write_list(dir.path(), json!(status_entries(1)));

    let progress = CollectingProgress::new();
    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &progress)
        .await
        .unwrap();

    assert_eq!(summary.stats.error, 1);
    let error = progress.events().into_iter().find_map(|event| match event {
        ProgressEvent::ItemUpdate { error, .. } => error,
        _ => None,
    });
    assert!(error.unwrap().contains("HTTP error! status: 503"));
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_body("1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.posts.max_attempts = 1;
    let list = write_list(dir.path(), json!(status_entries(1)));

    let started = Instant::now();
    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress)
        .await
        .unwrap();

    // A single attempt credit still succeeds after the rate-limited try
    assert_eq!(summary.stats.success, 1);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_invalid_document_is_retried_then_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/web/20230615120000id_/https://twitter.com/alice/status/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gone</html>"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let list = write_list(dir.path(), json!(status_entries(1)));

    let summary = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress)
        .await
        .unwrap();

    assert_eq!(summary.stats.error, 1);
    assert!(!dir.path().join("tweets").join("2023").exists());
}

#[tokio::test]
async fn test_unreadable_list_fails_run() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9", dir.path());
    let list = dir.path().join("list_alice.json");
    std::fs::write(&list, r#"{"not": "a list"}"#).unwrap();

    let result = archive_posts(&config, fetcher(&config), &list, "alice", &NoopProgress).await;
    assert!(matches!(result, Err(ArchiveError::List(_))));
}

#[tokio::test]
async fn test_empty_username_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9", dir.path());
    let list = write_list(dir.path(), json!([]));

    let result = archive_posts(&config, fetcher(&config), &list, "  ", &NoopProgress).await;
    assert!(matches!(result, Err(ArchiveError::EmptyUsername)));
}
