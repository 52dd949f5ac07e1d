//! HTTP fetcher implementation
//!
//! This module handles the network side of the engine:
//! - Building the shared HTTP client with user agent and timeouts
//! - Issuing one GET per attempt
//! - Surfacing status, `Retry-After`, and body to the executor
//!
//! Retry decisions are not made here; see [`crate::engine::retry`].

use crate::config::HttpConfig;
use crate::engine::retry::parse_retry_after;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Raw result of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Parsed `Retry-After` header, if present and readable
    pub retry_after: Option<Duration>,

    /// Response body; empty for non-2xx responses
    pub body: Bytes,
}

/// Category of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    Body,
    Other,
}

/// A fetch that produced no HTTP response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Performs a single GET of a snapshot URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP section of the configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use wayback_archiver::config::HttpConfig;
/// use wayback_archiver::engine::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_retry_after(value, Utc::now()));

        // Only successful bodies are ever used
        let body = if status.is_success() {
            response.bytes().await.map_err(|e| {
                FetchError::new(FailureKind::Body, format!("Failed to read body: {}", e))
            })?
        } else {
            Bytes::new()
        };

        Ok(FetchResponse {
            status: status.as_u16(),
            retry_after,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, format!("Request timeout: {}", err));
    }
    if err.is_connect() {
        return FetchError::new(FailureKind::Connect, format!("Connection failed: {}", err));
    }
    FetchError::new(FailureKind::Other, err.to_string())
}
