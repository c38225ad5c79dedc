//! `ksreport`: post Kubescape system reports from the command line

mod cli;
mod commands;
mod output;
mod tracing;

use crate::cli::Commands;
use crate::tracing::TracingConfig;
use ::tracing::instrument;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        ..Default::default()
    })?;

    execute(cli.command).await
}

#[instrument(skip_all, fields(correlation_id = %crate::tracing::correlation_id()))]
async fn execute(command: Commands) -> miette::Result<()> {
    match command {
        Commands::Send(args) => {
            let outcome = commands::send(&args).await?;
            output::print_json(&outcome)
        }
        Commands::Annotations(args) => {
            let annotations = commands::annotations(&args)?;
            output::print_json(&annotations)
        }
    }
}
