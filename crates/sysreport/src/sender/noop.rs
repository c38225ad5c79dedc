use super::{ErrorSink, ReportSender};
use crate::error::Result;
use crate::retry::Delivery;
use async_trait::async_trait;

/// Sender used when reporting is disabled.
///
/// Nothing is mutated and nothing leaves the process; [`send`](ReportSender::send)
/// reports a `200` with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReportSender;

impl NoReportSender {
    /// Create a disabled sender
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportSender for NoReportSender {
    async fn send(&self) -> Result<Delivery> {
        Ok(Delivery {
            status: 200,
            body: String::new(),
        })
    }

    async fn send_and_advance(&self, _advance: bool, _errors: Option<&ErrorSink>) {}

    async fn send_action(&self, _action: &str, _send_report: bool, _errors: Option<&ErrorSink>) {}

    async fn send_status(&self, _status: &str, _send_report: bool, _errors: Option<&ErrorSink>) {}

    async fn send_details(&self, _details: &str, _send_report: bool, _errors: Option<&ErrorSink>) {}

    async fn send_error(
        &self,
        _error: Option<&(dyn std::error::Error + Send + Sync)>,
        _send_report: bool,
        _init_errors: bool,
        _errors: Option<&ErrorSink>,
    ) {
    }

    async fn send_warning(
        &self,
        _warning: &str,
        _send_report: bool,
        _init_warnings: bool,
        _errors: Option<&ErrorSink>,
    ) {
    }
}
