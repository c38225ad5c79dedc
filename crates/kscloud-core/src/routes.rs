//! Backend routes and headers used by the report senders

/// System (job status) reports
pub const REPORTER_SYSTEM_REPORT_PATH: &str = "/k8s/sysreport";

/// Content type sent with every JSON body
pub const CONTENT_TYPE_JSON: &str = "application/json";
