//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request.
///
/// When the queue runs dry the `repeat` response, if any, is served forever.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    repeat: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_bytes(status, body.to_string().into_bytes())
    }

    /// Queue a raw response.
    pub fn push_bytes(&self, status: u16, body: Vec<u8>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse { status, body });
        self
    }

    /// Serve this JSON once the queue is empty.
    pub fn repeat_json(&self, status: u16, body: Value) -> &Self {
        *self.repeat.lock().unwrap() = Some(HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        });
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// URLs of every request sent so far.
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Number of requests sent to `url`.
    pub fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(request);

        let next = self.responses.lock().unwrap().pop_front();
        match next.or_else(|| self.repeat.lock().unwrap().clone()) {
            Some(response) => Ok(response),
            None => Err(ClientError::UnexpectedStatus {
                status: 0,
                body: "no scripted response".to_string(),
            }),
        }
    }
}

static NEXT_TEMP: AtomicU32 = AtomicU32::new(0);

/// A fresh path under the system temp dir ending in `name`. Nothing is created.
pub fn temp_path(name: &str) -> PathBuf {
    let n = NEXT_TEMP.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("kling-test-{}-{n}-{name}", std::process::id()))
}
