//! The report record.
//!
//! [`Report`] is the plain data behind a job's reporting timeline. It is
//! serialized as-is for delivery, so field names follow the backend's wire
//! format. Shared access goes through [`SharedReport`](crate::SharedReport),
//! which guards a `Report` with an exclusive lock.

use crate::annotations::JobAnnotations;
use crate::status::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body the backend answers with when it has nothing else to say
pub const SUCCESS_SENTINEL: &str = "ok";

/// One job's reporting state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    #[serde(rename = "customerGUID")]
    customer_guid: String,

    reporter: String,

    /// Workload, cluster or other scope the job applies to
    target: String,

    status: String,

    #[serde(rename = "action")]
    action_name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,

    /// String mirror of `action_id_n`
    #[serde(rename = "actionID")]
    action_id: String,

    #[serde(rename = "numSeq")]
    action_id_n: i64,

    /// Assigned by the backend on the first successful send
    #[serde(rename = "jobID")]
    job_id: String,

    #[serde(rename = "parentAction", skip_serializing_if = "String::is_empty")]
    parent_action: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    details: String,

    timestamp: DateTime<Utc>,
}

impl Report {
    /// Create a report for a reporter that is just starting.
    ///
    /// The status is `started`, the action is `Starting <reporter>` and the
    /// action sequence begins at 1.
    #[must_use]
    pub fn new(customer_guid: impl Into<String>, reporter: impl Into<String>) -> Self {
        let reporter = reporter.into();
        Self {
            customer_guid: customer_guid.into(),
            action_name: format!("Starting {reporter}"),
            reporter,
            status: JobStatus::Started.into(),
            action_id: "1".to_string(),
            action_id_n: 1,
            ..Default::default()
        }
    }

    /// Account id
    #[must_use]
    pub fn customer_guid(&self) -> &str {
        &self.customer_guid
    }

    /// Reporting component
    #[must_use]
    pub fn reporter(&self) -> &str {
        &self.reporter
    }

    /// Scope the job applies to
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Current stage description
    #[must_use]
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Errors collected since the last reset
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Action id as sent on the wire
    #[must_use]
    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    /// Action sequence number
    #[must_use]
    pub const fn action_id_n(&self) -> i64 {
        self.action_id_n
    }

    /// Backend job id, empty until the first successful send
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Parent action id
    #[must_use]
    pub fn parent_action(&self) -> &str {
        &self.parent_action
    }

    /// Free-form details
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Time of the last send attempt
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// String form of the current sequence number.
    ///
    /// This is the id the next component continues from.
    #[must_use]
    pub fn next_action_id(&self) -> String {
        self.action_id_n.to_string()
    }

    /// Replace the account id
    pub fn set_customer_guid(&mut self, customer_guid: impl Into<String>) {
        self.customer_guid = customer_guid.into();
    }

    /// Replace the reporter name; stored upper-cased
    pub fn set_reporter(&mut self, reporter: &str) {
        self.reporter = reporter.to_uppercase();
    }

    /// Replace the target
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    /// Replace the status
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Replace the action name
    pub fn set_action_name(&mut self, action_name: impl Into<String>) {
        self.action_name = action_name.into();
    }

    /// Replace the details
    pub fn set_details(&mut self, details: impl Into<String>) {
        self.details = details.into();
    }

    /// Replace the action id verbatim; the sequence number is left alone
    pub fn set_action_id(&mut self, action_id: impl Into<String>) {
        self.action_id = action_id.into();
    }

    /// Replace the job id, whatever it was before
    pub fn set_job_id(&mut self, job_id: impl Into<String>) {
        self.job_id = job_id.into();
    }

    /// Replace the parent action id
    pub fn set_parent_action(&mut self, parent_action: impl Into<String>) {
        self.parent_action = parent_action.into();
    }

    /// Replace the timestamp
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Set the sequence number and resync the action id
    pub fn set_action_id_n(&mut self, action_id_n: i64) {
        self.action_id_n = action_id_n;
        self.action_id = self.next_action_id();
    }

    /// Move to the next pipeline stage
    pub fn next_action(&mut self) {
        self.set_action_id_n(self.action_id_n + 1);
    }

    /// Append a non-critical error so the path to a failure stays visible
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Drop every collected error
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Composite identity used to correlate log lines.
    ///
    /// Not a protocol identifier.
    #[must_use]
    pub fn identity(&self) -> String {
        format!(
            "{}::{}::{} (verbose:  {}::{})",
            self.target, self.job_id, self.action_id, self.parent_action, self.action_name
        )
    }

    /// Build the annotation a downstream component resumes from.
    ///
    /// `set_parent` hands the job id over as the parent job, `set_current`
    /// as the job to continue. Returns the annotation and the next action
    /// id, which is the current sequence number before any increment.
    #[must_use]
    pub fn annotation_payload(&self, set_parent: bool, set_current: bool) -> (JobAnnotations, String) {
        let next_action_id = self.next_action_id();
        let annotations = JobAnnotations {
            current_job_id: if set_current { self.job_id.clone() } else { String::new() },
            parent_job_id: if set_parent { self.job_id.clone() } else { String::new() },
            last_action_id: next_action_id.clone(),
        };
        (annotations, next_action_id)
    }

    /// Compare two reports the way the backend tells them apart.
    ///
    /// Account id and details are ignored; timestamps are compared at
    /// whole-second precision.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.job_id == other.job_id
            && self.status == other.status
            && self.reporter == other.reporter
            && self.target == other.target
            && self.action_id == other.action_id
            && self.action_name == other.action_name
            && self.parent_action == other.parent_action
            && self.action_id_n == other.action_id_n
            && self.timestamp.timestamp() == other.timestamp.timestamp()
            && self.errors == other.errors
    }

    /// Stamp the send time and make sure the sequence has started
    pub(crate) fn prepare_for_send(&mut self, now: DateTime<Utc>) {
        self.timestamp = now;
        if self.action_id.is_empty() {
            self.action_id = "1".to_string();
            self.action_id_n = 1;
        }
    }

    /// Adopt the job id from the first successful response.
    ///
    /// Returns `true` when the id was taken.
    pub(crate) fn adopt_job_id(&mut self, status: u16, body: &str) -> bool {
        let success = (200..300).contains(&status);
        if self.job_id.is_empty() && body != SUCCESS_SENTINEL && success {
            self.job_id = body.to_string();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_report_defaults() {
        let report = Report::new("guid1", "reporter1");
        assert_eq!(report.customer_guid(), "guid1");
        assert_eq!(report.reporter(), "reporter1");
        assert_eq!(report.status(), "started");
        assert_eq!(report.action_name(), "Starting reporter1");
        assert_eq!(report.action_id(), "1");
        assert_eq!(report.action_id_n(), 1);
        assert!(report.job_id().is_empty());
        assert!(report.errors().is_empty());
    }

    #[test]
    fn test_next_action_resyncs_action_id() {
        let mut report = Report::new("g", "r");
        report.next_action();
        report.next_action();
        assert_eq!(report.action_id_n(), 3);
        assert_eq!(report.action_id(), "3");

        report.set_action_id_n(20);
        assert_eq!(report.action_id(), "20");
    }

    #[test]
    fn test_set_action_id_is_verbatim() {
        let mut report = Report::new("g", "r");
        report.set_action_id("fork-7");
        assert_eq!(report.action_id(), "fork-7");
        assert_eq!(report.action_id_n(), 1);
    }

    #[test]
    fn test_set_reporter_upper_cases() {
        let mut report = Report::new("g", "r");
        report.set_reporter("testing reporter v2");
        assert_eq!(report.reporter(), "TESTING REPORTER V2");
    }

    #[test]
    fn test_identity_format() {
        let mut report = Report::new("g", "r");
        report.set_target("cluster/ns");
        report.set_job_id("job-1");
        report.set_parent_action("p");
        report.set_action_name("scan");
        assert_eq!(report.identity(), "cluster/ns::job-1::1 (verbose:  p::scan)");
    }

    #[test]
    fn test_annotation_payload_uses_pre_increment_id() {
        let mut report = Report::new("g", "r");
        report.set_job_id("job-1");
        report.set_action_id_n(4);

        let (annotations, next) = report.annotation_payload(true, false);
        assert_eq!(next, "4");
        assert_eq!(annotations.last_action_id, "4");
        assert_eq!(annotations.parent_job_id, "job-1");
        assert!(annotations.current_job_id.is_empty());

        let (annotations, _) = report.annotation_payload(false, true);
        assert_eq!(annotations.current_job_id, "job-1");
        assert!(annotations.parent_job_id.is_empty());
    }

    #[test]
    fn test_adopt_job_id_only_once() {
        let mut report = Report::new("g", "r");
        assert!(!report.adopt_job_id(200, SUCCESS_SENTINEL));
        assert!(report.job_id().is_empty());

        assert!(!report.adopt_job_id(500, "job-x"));
        assert!(report.job_id().is_empty());

        assert!(report.adopt_job_id(201, "job-1"));
        assert!(!report.adopt_job_id(200, "job-2"));
        assert_eq!(report.job_id(), "job-1");

        report.set_job_id("manual");
        assert_eq!(report.job_id(), "manual");
    }

    #[test]
    fn test_prepare_for_send_initializes_empty_action_id() {
        let mut report = Report::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        report.prepare_for_send(now);
        assert_eq!(report.action_id(), "1");
        assert_eq!(report.action_id_n(), 1);
        assert_eq!(report.timestamp(), now);
    }

    #[test]
    fn test_wire_field_names() {
        let mut report = Report::new("guid", "rep");
        report.set_parent_action("parent");
        report.set_details("d");
        report.add_error("e1");
        let value = serde_json::to_value(&report).unwrap();
        for key in [
            "customerGUID",
            "reporter",
            "target",
            "status",
            "action",
            "errors",
            "actionID",
            "numSeq",
            "jobID",
            "parentAction",
            "details",
            "timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing wire field {key}");
        }
    }

    #[test]
    fn test_empty_optional_fields_are_omitted() {
        let value = serde_json::to_value(Report::new("guid", "rep")).unwrap();
        assert!(value.get("errors").is_none());
        assert!(value.get("parentAction").is_none());
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_is_equivalent_ignores_sub_second_and_details() {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut lhs = Report::new("g1", "r");
        lhs.set_timestamp(base);
        let mut rhs = lhs.clone();
        rhs.set_customer_guid("g2");
        rhs.set_details("other");
        rhs.set_timestamp(base + chrono::Duration::milliseconds(300));
        assert!(lhs.is_equivalent(&rhs));

        rhs.add_error("e");
        assert!(!lhs.is_equivalent(&rhs));
    }
}
