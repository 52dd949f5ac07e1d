//! Integration tests for the archiver
//!
//! These tests use wiremock to stand in for the Wayback Machine and run whole
//! archive operations against temporary directories.

mod list_tests;
mod media_tests;
mod post_tests;

use std::path::Path;
use std::sync::Arc;
use wayback_archiver::config::{
    Config, EngineConfig, HttpConfig, OutputConfig, WaybackConfig,
};
use wayback_archiver::engine::{build_http_client, Fetcher, ReqwestFetcher};

/// Engine settings with short delays so retry paths finish quickly
pub fn fast_engine(workers: usize) -> EngineConfig {
    EngineConfig {
        workers,
        max_attempts: 3,
        retry_delay_ms: 20,
        rate_limit_delay_ms: 20,
        success_pacing_ms: 0,
        max_rate_limit_waits: 0,
        abort_on_fault: false,
    }
}

/// Creates a test configuration pointing at the mock server and `root`
pub fn create_test_config(server_uri: &str, root: &Path) -> Config {
    Config {
        wayback: WaybackConfig {
            base_url: format!("{}/web", server_uri),
            cdx_url: format!("{}/cdx/search/cdx", server_uri),
        },
        http: HttpConfig {
            user_agent: "ArchiverTest/1.0".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        },
        output: OutputConfig {
            tweets_dir: root.join("tweets"),
            attaches_dir: root.join("attaches"),
            list_dir: root.to_path_buf(),
        },
        posts: fast_engine(2),
        media: fast_engine(3),
    }
}

pub fn fetcher(config: &Config) -> Arc<dyn Fetcher> {
    let client = build_http_client(&config.http).expect("Failed to build client");
    Arc::new(ReqwestFetcher::new(client))
}
