//! Tracing setup for the `ksreport` binary

use std::io;
pub use tracing::Level;
use tracing_subscriber::{
    Layer, Registry, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

/// Log level options for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    pub level: Level,
    /// Explicit filter directive, overrides `level` and `RUST_LOG`
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

static CORRELATION_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Correlation id shared by every log line of this process
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Filter used when neither an explicit filter nor `RUST_LOG` is set
fn default_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("ksreport={level},kscloud_cli={level},kscloud_sysreport={level},kscloud_core={level}")
}

/// Stderr layer in the requested format
fn fmt_layer(format: TracingFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let base = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    match format {
        TracingFormat::Pretty => base.pretty().boxed(),
        TracingFormat::Compact => base.compact().with_target(false).boxed(),
        TracingFormat::Json => base.json().with_current_span(true).boxed(),
    }
}

/// Install the global subscriber: `config.filter`, else `RUST_LOG`, else
/// `config.level` for the kscloud crates
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let env_filter = match config.filter {
        Some(directive) => EnvFilter::try_new(directive),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive(config.level))),
    }
    .map_err(|e| miette::miette!("Invalid log filter: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt_layer(config.format).with_filter(env_filter))
        .init();

    tracing::debug!(
        correlation_id = %correlation_id(),
        format = ?config.format,
        "Logging ready"
    );
    Ok(())
}
