use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand};
use kscloud_sysreport::config::{
    ENV_EVENT_RECEIVER_URL, ENV_MAX_RETRIES, ENV_RETRY_DELAY_MS, ENV_SYSTEM_REPORT_PATH,
    ENV_TIMEOUT_SECS, ENV_TRACE,
};
use kscloud_sysreport::{RetryConfig, SenderConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ksreport")]
#[command(about = "Post Kubescape system reports to the event receiver")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Set logging level", default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    #[arg(long, global = true, help = "Log output format", default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Build a report and post it once")]
    Send(SendArgs),
    #[command(about = "Print the annotations handing a job over to another component")]
    Annotations(AnnotationArgs),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[arg(long, help = "Account the report belongs to")]
    pub customer_guid: String,

    #[arg(long, help = "Reporting component")]
    pub reporter: String,

    #[arg(long, help = "Workload, cluster or other scope of the job")]
    pub target: Option<String>,

    #[arg(long, help = "Job status (started, success, failure, warning, done)")]
    pub status: Option<String>,

    #[arg(long, help = "Current stage description")]
    pub action: Option<String>,

    #[arg(long, help = "Free-form details")]
    pub details: Option<String>,

    #[arg(long = "error", help = "Error message to attach; repeatable")]
    pub errors: Vec<String>,

    #[arg(long, help = "Backend job id to continue")]
    pub job_id: Option<String>,

    #[arg(long, help = "Parent action id")]
    pub parent_action: Option<String>,

    #[arg(long, help = "Action sequence number")]
    pub action_id_n: Option<i64>,

    #[arg(long, env = ENV_EVENT_RECEIVER_URL, help = "Event receiver base URL")]
    pub url: String,

    #[arg(long, env = ENV_SYSTEM_REPORT_PATH, help = "Path reports are posted to")]
    pub path: Option<String>,

    #[arg(long, env = ENV_MAX_RETRIES, default_value_t = 3, help = "Delivery attempts before giving up")]
    pub max_retries: usize,

    #[arg(long, env = ENV_RETRY_DELAY_MS, default_value_t = 5000, help = "Pause between attempts")]
    pub retry_delay_ms: u64,

    #[arg(long, env = ENV_TIMEOUT_SECS, help = "Per-request timeout")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = ENV_TRACE, help = "Log request and response bodies at debug level")]
    pub trace: bool,
}

impl SendArgs {
    /// Sender configuration from the connection flags
    pub fn sender_config(&self) -> SenderConfig {
        let mut config = SenderConfig::new(self.url.clone())
            .with_retry(RetryConfig::new(
                self.max_retries,
                Duration::from_millis(self.retry_delay_ms),
            ))
            .with_trace(self.trace);
        if let Some(path) = &self.path {
            config = config.with_system_report_path(path.clone());
        }
        config.timeout_secs = self.timeout_secs;
        config
    }
}

#[derive(Args, Debug)]
pub struct AnnotationArgs {
    #[arg(long, help = "Job id to hand over")]
    pub job_id: String,

    #[arg(long, default_value_t = 1, help = "Current action sequence number")]
    pub action_id_n: i64,

    #[arg(long, help = "Hand the job over as the parent job")]
    pub parent: bool,

    #[arg(long, help = "Hand the job over as the job to continue")]
    pub current: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL_ARGS: [&str; 2] = ["--url", "https://er.example.com"];

    fn send_args(extra: &[&str]) -> SendArgs {
        let mut argv = vec!["ksreport", "send", "--customer-guid", "g", "--reporter", "r"];
        argv.extend_from_slice(&URL_ARGS);
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Send(args) => args,
            Commands::Annotations(_) => panic!("Expected Send command"),
        }
    }

    #[test]
    fn test_cli_default_values() {
        temp_env::with_vars_unset(
            [ENV_MAX_RETRIES, ENV_RETRY_DELAY_MS, ENV_TRACE, ENV_SYSTEM_REPORT_PATH],
            || {
                let cli = Cli::try_parse_from(["ksreport", "annotations", "--job-id", "j"]).unwrap();
                assert_eq!(cli.log_level, LogLevel::Warn);
                assert_eq!(cli.log_format, TracingFormat::Compact);

                let args = send_args(&[]);
                assert_eq!(args.max_retries, 3);
                assert_eq!(args.retry_delay_ms, 5000);
                assert!(!args.trace);
                assert!(args.errors.is_empty());
            },
        );
    }

    #[test]
    fn test_send_flags() {
        let args = send_args(&[
            "--status", "failure", "--error", "first", "--error", "second", "--path", "/custom",
            "--max-retries", "2", "--retry-delay-ms", "0", "--trace",
        ]);
        assert_eq!(args.status.as_deref(), Some("failure"));
        assert_eq!(args.errors, vec!["first".to_string(), "second".to_string()]);

        let config = args.sender_config();
        assert_eq!(config.retry, RetryConfig::new(2, Duration::ZERO));
        assert_eq!(config.report_path(), "/custom");
        assert!(config.trace);
        assert_eq!(config.report_url().unwrap(), "https://er.example.com/custom");
    }

    #[test]
    fn test_url_from_env() {
        temp_env::with_var(ENV_EVENT_RECEIVER_URL, Some("http://from-env:8080"), || {
            let cli = Cli::try_parse_from([
                "ksreport", "send", "--customer-guid", "g", "--reporter", "r",
            ])
            .unwrap();
            let Commands::Send(args) = cli.command else {
                panic!("Expected Send command");
            };
            assert_eq!(args.url, "http://from-env:8080");
        });
    }

    #[test]
    fn test_send_requires_url() {
        temp_env::with_var_unset(ENV_EVENT_RECEIVER_URL, || {
            let result =
                Cli::try_parse_from(["ksreport", "send", "--customer-guid", "g", "--reporter", "r"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_annotation_flags() {
        let cli = Cli::try_parse_from([
            "ksreport", "annotations", "--job-id", "job-1", "--action-id-n", "4", "--current",
        ])
        .unwrap();
        let Commands::Annotations(args) = cli.command else {
            panic!("Expected Annotations command");
        };
        assert_eq!(args.job_id, "job-1");
        assert_eq!(args.action_id_n, 4);
        assert!(args.current);
        assert!(!args.parent);
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Cli::try_parse_from(["ksreport", "--log-level", "loud", "annotations", "--job-id", "j"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["ksreport"]).is_err());
    }
}
