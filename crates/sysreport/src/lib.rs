//! System reports for Kubescape cloud components
//!
//! A system report tracks one job as it moves through a pipeline: who is
//! reporting, which stage it is in, its status and the errors collected so
//! far. Components hand a [`SharedReport`] between tasks, mutate it through
//! a [`ReportSender`] and deliver it to the event receiver with bounded,
//! fixed-delay retries.
//!
//! ```no_run
//! use kscloud_sysreport::{BaseReportSender, Report, ReportSender, SenderConfig, SharedReport};
//!
//! # async fn run() -> kscloud_sysreport::Result<()> {
//! let report = SharedReport::new(Report::new("customer-guid", "scanner"));
//! let sender = BaseReportSender::new(&SenderConfig::from_env(), report)?;
//!
//! sender.send_action("Scanning", true, None).await;
//! sender.send_status("success", true, None).await;
//! # Ok(())
//! # }
//! ```

pub mod annotations;
pub mod config;
mod error;
pub mod report;
pub mod retry;
pub mod sender;
pub mod shared;
pub mod status;
pub mod transport;

pub use annotations::JobAnnotations;
pub use config::{RetryConfig, SenderConfig};
pub use error::{ReportError, Result, SENTINEL_STATUS};
pub use report::{Report, SUCCESS_SENTINEL};
pub use retry::{Delivery, UNREADABLE_BODY, post_with_retry};
pub use sender::{
    BaseReportSender, ErrorSink, NoReportSender, ReportSender, error_channel,
};
pub use shared::SharedReport;
pub use status::JobStatus;
pub use transport::{Headers, MockTransport, ReqwestTransport, Transport, TransportResponse};
