//! Configuration for report senders

use crate::error::Result;
use kscloud_core::{Endpoint, resolve_path, routes::REPORTER_SYSTEM_REPORT_PATH};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`SenderConfig::event_receiver_url`]
pub const ENV_EVENT_RECEIVER_URL: &str = "KS_EVENT_RECEIVER_URL";
/// Environment variable overriding [`SenderConfig::system_report_path`]
pub const ENV_SYSTEM_REPORT_PATH: &str = "KS_SYSTEM_REPORT_PATH";
/// Environment variable overriding [`RetryConfig::max_attempts`]
pub const ENV_MAX_RETRIES: &str = "KS_REPORT_MAX_RETRIES";
/// Environment variable overriding [`RetryConfig::retry_delay_ms`]
pub const ENV_RETRY_DELAY_MS: &str = "KS_REPORT_RETRY_DELAY_MS";
/// Environment variable overriding [`SenderConfig::timeout_secs`]
pub const ENV_TIMEOUT_SECS: &str = "KS_REPORT_TIMEOUT_SECS";
/// Environment variable overriding [`SenderConfig::trace`]
pub const ENV_TRACE: &str = "KS_REPORT_TRACE";

/// Configuration for a report sender
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderConfig {
    /// Event receiver host or URL (e.g. "report.example.com" or "http://localhost:7555")
    pub event_receiver_url: String,

    /// Path system reports are posted to; `/k8s/sysreport` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_report_path: Option<String>,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-request timeout applied to the HTTP client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Dump request and response bodies at debug level
    #[serde(default)]
    pub trace: bool,
}

impl SenderConfig {
    /// Configuration for the given event receiver with defaults elsewhere
    #[must_use]
    pub fn new(event_receiver_url: impl Into<String>) -> Self {
        Self {
            event_receiver_url: event_receiver_url.into(),
            ..Default::default()
        }
    }

    /// Override the retry configuration
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the system report path
    #[must_use]
    pub fn with_system_report_path(mut self, path: impl Into<String>) -> Self {
        self.system_report_path = Some(path.into());
        self
    }

    /// Enable request/response dumps
    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Defaults overlaid with the `KS_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Overlay the `KS_*` environment variables onto this configuration.
    ///
    /// Unparseable numeric values are logged and ignored.
    #[must_use]
    pub fn overlay_env(mut self) -> Self {
        if let Some(url) = env_string(ENV_EVENT_RECEIVER_URL) {
            self.event_receiver_url = url;
        }
        if let Some(path) = env_string(ENV_SYSTEM_REPORT_PATH) {
            self.system_report_path = Some(path);
        }
        if let Some(max_attempts) = env_parse::<usize>(ENV_MAX_RETRIES) {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(delay) = env_parse::<u64>(ENV_RETRY_DELAY_MS) {
            self.retry.retry_delay_ms = delay;
        }
        if let Some(timeout) = env_parse::<u64>(ENV_TIMEOUT_SECS) {
            self.timeout_secs = Some(timeout);
        }
        if let Some(trace) = env_string(ENV_TRACE) {
            self.trace = matches!(trace.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        self
    }

    /// Path reports are posted to
    #[must_use]
    pub fn report_path(&self) -> &str {
        resolve_path(self.system_report_path.as_deref(), REPORTER_SYSTEM_REPORT_PATH)
    }

    /// Full URL reports are posted to
    ///
    /// # Errors
    ///
    /// Returns an endpoint error if the event receiver URL cannot be resolved.
    pub fn report_url(&self) -> Result<String> {
        let endpoint = Endpoint::parse(&self.event_receiver_url)?;
        Ok(endpoint.url_for(self.report_path()))
    }

    /// Client timeout, if configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Fixed-delay retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Retry configuration with the given budget and delay
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(max_attempts: usize, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay_ms: retry_delay.as_millis() as u64,
        }
    }

    /// Pause between attempts
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

// Default value functions
fn default_max_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}
