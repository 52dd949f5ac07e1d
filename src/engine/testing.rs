//! In-memory fetcher for engine unit tests

use crate::engine::fetcher::{FailureKind, FetchError, FetchResponse, Fetcher};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Scripted = Result<FetchResponse, FetchError>;

/// Replays a fixed script of responses, then repeats the fallback (if any)
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: Scripted) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    pub fn ok(body: &[u8]) -> Scripted {
        Ok(FetchResponse {
            status: 200,
            retry_after: None,
            body: Bytes::copy_from_slice(body),
        })
    }

    pub fn status(status: u16) -> Scripted {
        Ok(FetchResponse {
            status,
            retry_after: None,
            body: Bytes::new(),
        })
    }

    pub fn rate_limited(retry_after: Option<Duration>) -> Scripted {
        Ok(FetchResponse {
            status: 429,
            retry_after,
            body: Bytes::new(),
        })
    }

    pub fn transport_error(message: &str) -> Scripted {
        Err(FetchError::new(FailureKind::Other, message))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => Err(FetchError::new(FailureKind::Other, "script exhausted")),
        }
    }
}
