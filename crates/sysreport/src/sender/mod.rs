//! Report senders.
//!
//! A [`ReportSender`] serializes a job's report and delivers it, and offers
//! "mutate then maybe send" wrappers that are safe to call from many tasks
//! at once. The wrappers never return delivery failures to their caller:
//! they are shaped for fire-and-forget use, so failures go to an optional
//! [`ErrorSink`] or to the log.
//!
//! Variants are picked by dependency injection:
//!
//! - [`BaseReportSender`] over [`ReqwestTransport`](crate::ReqwestTransport)
//!   delivers to the event receiver
//! - [`BaseReportSender`] over [`MockTransport`](crate::MockTransport)
//!   answers with a canned response
//! - [`NoReportSender`] does nothing and reports success

mod base;
mod noop;

pub use base::BaseReportSender;
pub use noop::NoReportSender;

use crate::error::{ReportError, Result};
use crate::retry::Delivery;
use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Capacity used by [`error_channel`]
pub const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 16;

/// Where fire-and-forget operations report delivery failures.
///
/// Writes are non-blocking: when the channel is full or its receiver is
/// gone, the failure is logged and dropped, so a caller that never reads
/// the channel cannot keep the report locked.
pub type ErrorSink = mpsc::Sender<ReportError>;

/// Create a bounded error channel for use with the send wrappers
#[must_use]
pub fn error_channel() -> (ErrorSink, mpsc::Receiver<ReportError>) {
    mpsc::channel(DEFAULT_ERROR_CHANNEL_CAPACITY)
}

/// Sends a job's report to the backend
#[async_trait]
pub trait ReportSender: Send + Sync {
    /// Serialize and deliver the report, blocking until delivery succeeds
    /// or the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the terminal delivery or serialization error;
    /// [`ReportError::status_code`] gives the HTTP-level status to report.
    async fn send(&self) -> Result<Delivery>;

    /// Send the report and, on success, move to the next action when
    /// `advance` is set.
    async fn send_and_advance(&self, advance: bool, errors: Option<&ErrorSink>);

    /// Set the action name, then send and advance if `send_report`
    async fn send_action(&self, action: &str, send_report: bool, errors: Option<&ErrorSink>);

    /// Set the status, then send and advance if `send_report`
    async fn send_status(&self, status: &str, send_report: bool, errors: Option<&ErrorSink>);

    /// Set the details, then send and advance if `send_report`
    async fn send_details(&self, details: &str, send_report: bool, errors: Option<&ErrorSink>);

    /// Record an error and mark the job as failed.
    ///
    /// The error (when given) is appended as `Action: <action>, Error: <error>`,
    /// the status becomes `failure`, the report is sent and advanced if
    /// `send_report`, and the error list is cleared afterwards if
    /// `init_errors`.
    async fn send_error(
        &self,
        error: Option<&(dyn std::error::Error + Send + Sync)>,
        send_report: bool,
        init_errors: bool,
        errors: Option<&ErrorSink>,
    );

    /// Record a warning and mark the job with `warning`.
    ///
    /// Same flow as [`send_error`](ReportSender::send_error); an empty
    /// warning is not appended.
    async fn send_warning(
        &self,
        warning: &str,
        send_report: bool,
        init_warnings: bool,
        errors: Option<&ErrorSink>,
    );
}

/// Hand a failure to the sink without ever waiting on it
pub(crate) fn report_failure(err: ReportError, sink: Option<&ErrorSink>, identity: &str) {
    let Some(sink) = sink else {
        warn!(report = identity, error = %err, "Failed to send system report");
        return;
    };
    match sink.try_send(err) {
        Ok(()) => {}
        Err(TrySendError::Full(err)) => {
            warn!(report = identity, error = %err, "Error channel full, dropping report failure");
        }
        Err(TrySendError::Closed(err)) => {
            warn!(report = identity, error = %err, "Error channel closed, dropping report failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_report_failure_never_blocks_on_full_channel() {
        let (sink, mut rx) = mpsc::channel(1);
        report_failure(ReportError::transport("u", "first"), Some(&sink), "id");
        let started = std::time::Instant::now();
        report_failure(ReportError::transport("u", "second"), Some(&sink), "id");
        assert!(started.elapsed() < Duration::from_millis(50));

        let first = rx.recv().await.unwrap();
        assert!(first.to_string().contains("first"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_report_failure_with_closed_channel() {
        let (sink, rx) = mpsc::channel(1);
        drop(rx);
        report_failure(ReportError::transport("u", "nobody listens"), Some(&sink), "id");
    }

    #[test]
    fn test_report_failure_without_sink_logs() {
        report_failure(ReportError::transport("u", "logged"), None, "id");
    }
}
