use crate::create_test_config;
use serde_json::json;
use tempfile::TempDir;
use wayback_archiver::archive::{generate_list, load_list};
use wayback_archiver::engine::{build_http_client, WorkItem};
use wayback_archiver::ArchiveError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_generate_list_writes_cdx_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .and(query_param("url", "twitter.com/alice*"))
        .and(query_param("output", "json"))
        .and(query_param("fl", "timestamp,original"))
        .and(query_param("collapse", "urlkey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            ["timestamp", "original"],
            ["20230615120000", "https://twitter.com/alice/status/1"],
            ["20230616120000", "https://twitter.com/alice/status/2"]
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let client = build_http_client(&config.http).unwrap();

    let path = generate_list(&client, &config, "alice").await.unwrap();

    assert_eq!(path, dir.path().join("list_alice.json"));
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n  "), "list should be pretty-printed");

    let items = load_list(&path).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0],
        WorkItem::Post {
            timestamp: "20230615120000".to_string(),
            original_url: "https://twitter.com/alice/status/1".to_string(),
        }
    );
}

#[tokio::test]
async fn test_existing_list_is_not_regenerated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let existing = dir.path().join("list_alice.json");
    std::fs::write(&existing, r#"[["20230615120000", "kept"]]"#).unwrap();
    let client = build_http_client(&config.http).unwrap();

    let path = generate_list(&client, &config, "alice").await.unwrap();

    assert_eq!(path, existing);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"[["20230615120000", "kept"]]"#
    );
}

#[tokio::test]
async fn test_cdx_error_status_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let client = build_http_client(&config.http).unwrap();

    let result = generate_list(&client, &config, "alice").await;

    assert!(matches!(
        result,
        Err(ArchiveError::HttpStatus { status: 503, .. })
    ));
    assert!(!dir.path().join("list_alice.json").exists());
}

#[tokio::test]
async fn test_empty_username_makes_no_request() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());
    let client = build_http_client(&config.http).unwrap();

    let result = generate_list(&client, &config, "").await;

    assert!(matches!(result, Err(ArchiveError::EmptyUsername)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
