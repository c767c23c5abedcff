//! `txbench` entry point.

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, CliConfig, CliError, LogFormat};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logs go to stderr so stdout only carries the report.
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn fail(err: CliError) -> ExitCode {
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    ExitCode::from(err.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration: environment first, flags on top
    let cli = Cli::parse();
    let config = cli.apply(CliConfig::from_env());

    // 2. Initialize tracing
    init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let metrics_handle = if cli.emit_metrics {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(err) => return fail(CliError::Metrics(err.to_string())),
        }
    } else {
        None
    };

    // 4. Run the command
    match cli::run(&cli, &config).await {
        Ok(output) => {
            let metrics = metrics_handle.map(|handle| handle.render());
            let written = cli::write_output(
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
                &output,
                metrics.as_deref(),
                cli.json,
            );
            match written {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => fail(err),
            }
        }
        Err(err) => fail(err),
    }
}
