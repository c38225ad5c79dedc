//! `ksreport` subcommands

use crate::cli::{AnnotationArgs, SendArgs};
use kscloud_core::annotations::{JOB, JOB_ACTION_PATH, JOB_ID_PATH, JOB_PARENT_PATH};
use kscloud_sysreport::{BaseReportSender, JobStatus, Report, ReportSender, SharedReport};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// What `send` reports back
#[derive(Debug, Serialize)]
pub struct SendOutcome {
    pub status: u16,
    pub body: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "actionID")]
    pub action_id: String,
}

/// Build the report described by the flags
pub fn build_report(args: &SendArgs) -> miette::Result<Report> {
    let mut report = Report::new(args.customer_guid.clone(), args.reporter.clone());

    if let Some(status) = &args.status {
        let status: JobStatus = status.parse().map_err(|e: String| miette::miette!("{e}"))?;
        report.set_status(status);
    }
    if let Some(target) = &args.target {
        report.set_target(target.clone());
    }
    if let Some(action) = &args.action {
        report.set_action_name(action.clone());
    }
    if let Some(details) = &args.details {
        report.set_details(details.clone());
    }
    if let Some(job_id) = &args.job_id {
        report.set_job_id(job_id.clone());
    }
    if let Some(parent_action) = &args.parent_action {
        report.set_parent_action(parent_action.clone());
    }
    if let Some(action_id_n) = args.action_id_n {
        report.set_action_id_n(action_id_n);
    }
    for error in &args.errors {
        report.add_error(error.clone());
    }
    Ok(report)
}

/// Post the report once, with the configured retries
pub async fn send(args: &SendArgs) -> miette::Result<SendOutcome> {
    let report = SharedReport::new(build_report(args)?);
    let sender = BaseReportSender::new(&args.sender_config(), report)?;

    info!(url = sender.url(), "Sending system report");
    let delivery = sender.send().await?;

    let report = sender.report().snapshot().await;
    Ok(SendOutcome {
        status: delivery.status,
        body: delivery.body,
        job_id: report.job_id().to_string(),
        action_id: report.action_id().to_string(),
    })
}

/// Annotation keys and values handing the job over
pub fn annotations(args: &AnnotationArgs) -> miette::Result<Map<String, Value>> {
    let mut report = Report::default();
    report.set_job_id(args.job_id.clone());
    report.set_action_id_n(args.action_id_n);

    let (payload, next_action_id) = report.annotation_payload(args.parent, args.current);
    let serialized = payload
        .to_json()
        .map_err(|e| miette::miette!("Failed to serialize job annotation: {e}"))?;

    let mut out = Map::new();
    out.insert(JOB.to_string(), Value::String(serialized));
    if !payload.current_job_id.is_empty() {
        out.insert(JOB_ID_PATH.to_string(), Value::String(payload.current_job_id));
    }
    if !payload.parent_job_id.is_empty() {
        out.insert(JOB_PARENT_PATH.to_string(), Value::String(payload.parent_job_id));
    }
    out.insert(JOB_ACTION_PATH.to_string(), Value::String(next_action_id));
    Ok(out)
}
