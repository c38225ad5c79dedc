//! Single-attempt HTTP delivery.
//!
//! A [`Transport`] performs exactly one POST and reports what happened.
//! Retrying is layered on top in [`crate::retry`], so transports stay
//! trivial to swap out in tests.

use crate::error::{ReportError, Result};
use crate::report::SUCCESS_SENTINEL;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Headers sent with a request, in insertion order
pub type Headers = Vec<(String, String)>;

/// What came back from one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, `None` when it could not be read
    pub body: Option<String>,
}

impl TransportResponse {
    /// Response with a readable body
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    /// Whether the status is in the 2xx range
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP POST attempt
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post `body` to `url`.
    ///
    /// Errors only when no response was received at all; non-2xx statuses
    /// are returned as responses.
    async fn post(&self, url: &str, headers: &Headers, body: &[u8]) -> Result<TransportResponse>;
}

/// Transport backed by a shared [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with an optional per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Client`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "kscloud-sysreport/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ReportError::Client {
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, url: &str, headers: &Headers, body: &[u8]) -> Result<TransportResponse> {
        let mut request = self.client.post(url).body(body.to_vec());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReportError::transport(url, e.to_string()))?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(url, error = %e, "Failed to read response body");
                None
            }
        };
        Ok(TransportResponse { status, body })
    }
}

/// Transport answering every request with a canned response.
///
/// Counts attempts and keeps the last request body so tests can inspect
/// what was sent.
#[derive(Debug)]
pub struct MockTransport {
    response: TransportResponse,
    attempts: AtomicUsize,
    last_body: Mutex<Option<Vec<u8>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new(TransportResponse::new(200, SUCCESS_SENTINEL))
    }
}

impl MockTransport {
    /// Answer every request with `response`
    #[must_use]
    pub const fn new(response: TransportResponse) -> Self {
        Self {
            response,
            attempts: AtomicUsize::new(0),
            last_body: Mutex::new(None),
        }
    }

    /// Number of requests received so far
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Body of the most recent request
    #[must_use]
    pub fn last_body(&self) -> Option<Vec<u8>> {
        self.last_body.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, _url: &str, _headers: &Headers, body: &[u8]) -> Result<TransportResponse> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_body.lock() {
            *guard = Some(body.to_vec());
        }
        Ok(self.response.clone())
    }
}
