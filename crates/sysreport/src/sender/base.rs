use super::{ErrorSink, ReportSender, report_failure};
use crate::config::{RetryConfig, SenderConfig};
use crate::error::{ReportError, Result};
use crate::report::Report;
use crate::retry::{Delivery, post_with_retry};
use crate::shared::SharedReport;
use crate::status::JobStatus;
use crate::transport::{Headers, MockTransport, ReqwestTransport, Transport};
use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use kscloud_core::routes::CONTENT_TYPE_JSON;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Delivers a shared [`Report`] to the event receiver.
///
/// The sender itself only holds configuration and a transport; cloning it
/// is cheap and every clone works on the same report. All report access
/// goes through the report's lock, which is also held while a report is
/// being delivered, so deliveries and mutations are serialized in lock
/// order.
#[derive(Clone)]
pub struct BaseReportSender {
    url: String,
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    trace: bool,
    report: SharedReport,
}

impl std::fmt::Debug for BaseReportSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseReportSender")
            .field("url", &self.url)
            .field("retry", &self.retry)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl BaseReportSender {
    /// Create a sender delivering over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the event receiver URL cannot be resolved or the
    /// HTTP client cannot be built.
    pub fn new(config: &SenderConfig, report: SharedReport) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, Arc::new(transport), report)
    }

    /// Create a sender delivering through the given transport
    ///
    /// # Errors
    ///
    /// Returns an error if the event receiver URL cannot be resolved.
    pub fn with_transport(
        config: &SenderConfig,
        transport: Arc<dyn Transport>,
        report: SharedReport,
    ) -> Result<Self> {
        let url = config.report_url()?;
        debug!(%url, max_attempts = config.retry.max_attempts, "Created report sender");
        Ok(Self {
            url,
            transport,
            retry: config.retry.clone(),
            trace: config.trace,
            report,
        })
    }

    /// Create a sender whose deliveries always answer `200 "ok"`.
    ///
    /// Returns the transport too so callers can count deliveries.
    #[must_use]
    pub fn mock(report: SharedReport) -> (Self, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::default());
        let sender = Self {
            url: "https://mock.invalid/k8s/sysreport".to_string(),
            transport: transport.clone(),
            retry: RetryConfig::default(),
            trace: false,
            report,
        };
        (sender, transport)
    }

    /// The report this sender delivers
    #[must_use]
    pub const fn report(&self) -> &SharedReport {
        &self.report
    }

    /// URL reports are posted to
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send and advance on a background task.
    ///
    /// The returned handle may be dropped; failures go to `errors` or the log.
    pub fn spawn_send_and_advance(&self, advance: bool, errors: Option<ErrorSink>) -> JoinHandle<()> {
        let sender = self.clone();
        tokio::spawn(async move {
            sender.send_and_advance(advance, errors.as_ref()).await;
        })
    }

    /// Serialize and deliver a report the caller already holds locked
    async fn deliver(&self, report: &mut Report) -> Result<Delivery> {
        report.prepare_for_send(Utc::now());
        let body = serde_json::to_vec(&*report)?;

        if self.trace {
            debug!(
                url = %self.url,
                request = %String::from_utf8_lossy(&body),
                "Posting system report"
            );
        }

        let headers: Headers = vec![("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())];
        let delivery = post_with_retry(
            self.transport.as_ref(),
            &self.retry,
            &self.url,
            &headers,
            &body,
            &report.identity(),
        )
        .await?;

        if self.trace {
            debug!(status = delivery.status, response = %delivery.body, "System report response");
        }
        if report.adopt_job_id(delivery.status, &delivery.body) {
            debug!(job_id = %report.job_id(), "Adopted job id from event receiver");
        }
        Ok(delivery)
    }

    /// Deliver, then advance the action sequence on success
    async fn deliver_and_advance(&self, report: &mut Report, advance: bool) -> Result<()> {
        self.deliver(report).await?;
        if advance {
            report.next_action();
        }
        Ok(())
    }

    /// Deliver under a held lock, routing failures and panics to the sink
    async fn deliver_reporting(&self, report: &mut Report, advance: bool, errors: Option<&ErrorSink>) {
        let identity = report.identity();
        let outcome = AssertUnwindSafe(self.deliver_and_advance(report, advance))
            .catch_unwind()
            .await;

        let result = outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(report = %identity, panic = %message, "Recovered from panic while sending report");
            Err(ReportError::Panicked { message })
        });

        if let Err(err) = result {
            report_failure(err, errors, &identity);
        }
    }
}

#[async_trait]
impl ReportSender for BaseReportSender {
    async fn send(&self) -> Result<Delivery> {
        let mut report = self.report.lock().await;
        self.deliver(&mut report).await
    }

    async fn send_and_advance(&self, advance: bool, errors: Option<&ErrorSink>) {
        let mut report = self.report.lock().await;
        self.deliver_reporting(&mut report, advance, errors).await;
    }

    async fn send_action(&self, action: &str, send_report: bool, errors: Option<&ErrorSink>) {
        let mut report = self.report.lock().await;
        report.set_action_name(action);
        if send_report {
            self.deliver_reporting(&mut report, true, errors).await;
        }
    }

    async fn send_status(&self, status: &str, send_report: bool, errors: Option<&ErrorSink>) {
        let mut report = self.report.lock().await;
        report.set_status(status);
        if send_report {
            self.deliver_reporting(&mut report, true, errors).await;
        }
    }

    async fn send_details(&self, details: &str, send_report: bool, errors: Option<&ErrorSink>) {
        let mut report = self.report.lock().await;
        report.set_details(details);
        if send_report {
            self.deliver_reporting(&mut report, true, errors).await;
        }
    }

    async fn send_error(
        &self,
        error: Option<&(dyn std::error::Error + Send + Sync)>,
        send_report: bool,
        init_errors: bool,
        errors: Option<&ErrorSink>,
    ) {
        let mut report = self.report.lock().await;
        if let Some(error) = error {
            let message = format!("Action: {}, Error: {}", report.action_name(), error);
            report.add_error(message);
        }
        report.set_status(JobStatus::Failure);

        if send_report {
            self.deliver_reporting(&mut report, true, errors).await;
        }
        if init_errors {
            report.clear_errors();
        }
    }

    async fn send_warning(
        &self,
        warning: &str,
        send_report: bool,
        init_warnings: bool,
        errors: Option<&ErrorSink>,
    ) {
        let mut report = self.report.lock().await;
        if !warning.is_empty() {
            let message = format!("Action: {}, Error: {}", report.action_name(), warning);
            report.add_error(message);
        }
        report.set_status(JobStatus::Warning);

        if send_report {
            self.deliver_reporting(&mut report, true, errors).await;
        }
        if init_warnings {
            report.clear_errors();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResponse;

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn post(&self, _u: &str, _h: &Headers, _b: &[u8]) -> Result<TransportResponse> {
            panic!("transport exploded");
        }
    }

    fn shared() -> SharedReport {
        SharedReport::new(Report::new("guid1", "reporter1"))
    }

    #[tokio::test]
    async fn test_send_adopts_job_id_once() {
        let transport = Arc::new(MockTransport::new(TransportResponse::new(200, "job-1")));
        let sender = BaseReportSender::with_transport(
            &SenderConfig::new("http://er"),
            transport.clone(),
            shared(),
        )
        .unwrap();

        let delivery = sender.send().await.unwrap();
        assert_eq!(delivery.status, 200);
        assert_eq!(sender.report().job_id().await, "job-1");

        sender.report().set_job_id("explicit").await;
        sender.send().await.unwrap();
        assert_eq!(sender.report().job_id().await, "explicit");
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn test_send_ok_body_keeps_job_id_empty() {
        let (sender, _) = BaseReportSender::mock(shared());
        sender.send().await.unwrap();
        assert!(sender.report().job_id().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_stamps_timestamp_and_initializes_action_id() {
        let (sender, transport) = BaseReportSender::mock(shared());
        sender.report().set_action_id("").await;
        let before = Utc::now();
        sender.send().await.unwrap();

        let snapshot = sender.report().snapshot().await;
        assert_eq!(snapshot.action_id(), "1");
        assert_eq!(snapshot.action_id_n(), 1);
        assert!(snapshot.timestamp() >= before);

        let sent: Report = serde_json::from_slice(&transport.last_body().unwrap()).unwrap();
        assert_eq!(sent.action_id(), "1");
        assert_eq!(sent.customer_guid(), "guid1");
    }

    #[tokio::test]
    async fn test_send_and_advance() {
        let (sender, _) = BaseReportSender::mock(shared());
        sender.send_and_advance(true, None).await;
        sender.send_and_advance(false, None).await;
        sender.send_and_advance(true, None).await;
        assert_eq!(sender.report().action_id_n().await, 3);
        assert_eq!(sender.report().action_id().await, "3");
    }

    #[tokio::test]
    async fn test_spawned_send_and_advance() {
        let (sender, transport) = BaseReportSender::mock(shared());
        let (sink, mut rx) = super::super::error_channel();
        sender.spawn_send_and_advance(true, Some(sink)).await.unwrap();
        assert_eq!(transport.attempts(), 1);
        assert_eq!(sender.report().action_id_n().await, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_panicking_transport_is_recovered() {
        let sender = BaseReportSender::with_transport(
            &SenderConfig::new("http://er"),
            Arc::new(PanickingTransport),
            shared(),
        )
        .unwrap();
        let (sink, mut rx) = super::super::error_channel();

        sender.send_status("success", true, Some(&sink)).await;

        let err = rx.recv().await.unwrap();
        assert!(matches!(err, ReportError::Panicked { ref message } if message.contains("exploded")));
        // Lock is usable again and the sequence did not move
        assert_eq!(sender.report().status().await, "success");
        assert_eq!(sender.report().action_id_n().await, 1);
    }

    #[tokio::test]
    async fn test_send_error_without_error_only_sets_status() {
        let (sender, transport) = BaseReportSender::mock(shared());
        sender.send_error(None, false, false, None).await;
        assert_eq!(sender.report().status().await, "failure");
        assert!(sender.report().errors().await.is_empty());
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_send_warning_message_format() {
        let (sender, _) = BaseReportSender::mock(shared());
        sender.report().set_action_name("scan").await;
        sender.send_warning("slow registry", false, false, None).await;
        sender.send_warning("", false, false, None).await;
        assert_eq!(
            sender.report().errors().await,
            vec!["Action: scan, Error: slow registry".to_string()]
        );
        assert_eq!(sender.report().status().await, "warning");
    }

    #[tokio::test]
    async fn test_send_details_sends_when_requested() {
        let (sender, transport) = BaseReportSender::mock(shared());
        sender.send_details("details", false, None).await;
        assert_eq!(transport.attempts(), 0);
        sender.send_details("details", true, None).await;
        assert_eq!(transport.attempts(), 1);
        assert_eq!(sender.report().details().await, "details");
        assert_eq!(sender.report().action_id_n().await, 2);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = BaseReportSender::with_transport(
            &SenderConfig::new("ftp://nope"),
            Arc::new(MockTransport::default()),
            shared(),
        );
        assert!(matches!(result, Err(ReportError::Endpoint(_))));
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
