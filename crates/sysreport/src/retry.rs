//! Bounded fixed-delay retry around a [`Transport`]
//!
//! A 2xx response ends the loop. Transport failures and other statuses sleep
//! the configured delay and try again until the attempt budget is spent.

use crate::config::RetryConfig;
use crate::error::{ReportError, Result};
use crate::transport::{Headers, Transport};
use backoff::backoff::{Backoff, Constant};
use std::time::Duration;
use tracing::{debug, warn};

/// Stands in for a response body that could not be read
pub const UNREADABLE_BODY: &str = "body could not be fetched";

/// A successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status, always 2xx
    pub status: u16,
    /// Response body, or [`UNREADABLE_BODY`]
    pub body: String,
}

/// POST `body` to `url`, retrying failures within the configured budget.
///
/// `identity` is only used to give the exhausted-retry error some context.
///
/// # Errors
///
/// - [`ReportError::RetryExhausted`] once every attempt failed
/// - [`ReportError::EmptyResponse`] if the budget allowed no attempt at all
/// - a non-retryable transport error as-is
pub async fn post_with_retry(
    transport: &dyn Transport,
    config: &RetryConfig,
    url: &str,
    headers: &Headers,
    body: &[u8],
    identity: &str,
) -> Result<Delivery> {
    let mut backoff = Constant::new(config.retry_delay());

    for attempt in 0..config.max_attempts {
        let (failure, response_text) = match transport.post(url, headers, body).await {
            Ok(response) => {
                let text = response
                    .body
                    .clone()
                    .unwrap_or_else(|| UNREADABLE_BODY.to_string());
                if response.is_success() {
                    if attempt > 0 {
                        debug!(url, attempts = attempt + 1, "Report delivered after retry");
                    }
                    return Ok(Delivery {
                        status: response.status,
                        body: text,
                    });
                }
                (ReportError::status(url, response.status, text.clone()), text)
            }
            Err(err) => (err, UNREADABLE_BODY.to_string()),
        };

        if !failure.is_retryable() {
            debug!(url, error = %failure, "Error is not retryable, failing immediately");
            return Err(failure);
        }

        if attempt + 1 >= config.max_attempts {
            warn!(
                url,
                attempts = attempt + 1,
                error = %failure,
                "Report delivery failed after maximum retries"
            );
            return Err(ReportError::retry_exhausted(
                attempt,
                identity,
                url,
                &String::from_utf8_lossy(body),
                &response_text,
                failure,
            ));
        }

        let delay = backoff.next_backoff().unwrap_or(Duration::ZERO);
        warn!(
            url,
            attempt = attempt + 1,
            error = %failure,
            retry_in_ms = config.retry_delay_ms,
            "Report delivery failed, retrying"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(ReportError::EmptyResponse {
        url: url.to_string(),
    })
}
