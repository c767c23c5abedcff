//! `txbench` command implementation.
//!
//! The binary parses arguments and initialises logging; everything else
//! lives here so commands can be driven against any [`GatewayClient`].

pub mod args;
pub mod config;
pub mod error;
pub mod report;

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::Pattern;
use gateway::{FaultToggle, GatewayClient, HttpGatewayClient, InMemoryGateway};
use harness::{Harness, HarnessError, OrderProfile, RequestBuilder};
use serde::Serialize;

pub use args::{Cli, Command, ConfigAction, Switch};
pub use config::{CliConfig, LogFormat};
pub use error::{CliError, Result};

use report::{AckView, BatchView, ComparisonView, ConfigStatusView, ResultView};

/// Runs the parsed command and returns the text to print.
pub async fn run(cli: &Cli, config: &CliConfig) -> Result<String> {
    let profile = match &cli.order_file {
        Some(path) => OrderProfile::from_file(path)?,
        None => OrderProfile::default(),
    };
    let builder = RequestBuilder::new(profile)?;

    let stop = Arc::new(AtomicBool::new(false));
    if matches!(cli.command, Command::Batch { .. }) {
        stop_on_ctrl_c(Arc::clone(&stop));
    }

    if cli.offline {
        let mut harness = Harness::new(InMemoryGateway::new(), builder);
        execute(&mut harness, &cli.command, config, cli.json, &stop).await
    } else {
        let client = HttpGatewayClient::new(config.gateway_url.as_str())?;
        let mut harness = Harness::new(client, builder);
        execute(&mut harness, &cli.command, config, cli.json, &stop).await
    }
}

/// Executes one command on a harness.
///
/// A batch checks `stop` after every run and ends early once it is set.
pub async fn execute<G: GatewayClient>(
    harness: &mut Harness<G>,
    command: &Command,
    config: &CliConfig,
    json: bool,
    stop: &AtomicBool,
) -> Result<String> {
    tracing::debug!(session = %harness.session_id(), ?command, "executing command");

    match command {
        Command::Single { pattern } => {
            let pattern: Pattern = pattern.parse().map_err(HarnessError::from)?;
            let result = harness.run_single(pattern).await;
            render(json, &result, || ResultView(&result).to_string())
        }
        Command::Compare => {
            let report = harness.run_compare().await;
            render(json, &report, || ComparisonView(&report).to_string())
        }
        Command::Batch { .. } => {
            let paired = harness
                .run_batch_with_progress(config.batch_size, |_| {
                    if stop.load(Ordering::Relaxed) {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })
                .await?;
            let snapshot = harness.snapshot();
            render(json, snapshot.as_ref(), || BatchView(&paired).to_string())
        }
        Command::Config {
            action: ConfigAction::Status,
        } => {
            let status = harness.fault_status().await?;
            render(json, &status, || ConfigStatusView(&status).to_string())
        }
        Command::Config {
            action:
                ConfigAction::Set {
                    category,
                    setting,
                    state,
                },
        } => {
            let toggle = FaultToggle::new(*category, *setting)?;
            let ack = harness.set_fault(toggle, state.enabled()).await?;
            render(json, &ack, || AckView(&ack).to_string())
        }
    }
}

/// Writes the command output, followed by the metrics rendering if any.
///
/// With `json` set the metrics go to `stderr` so `stdout` stays a single
/// JSON document.
pub fn write_output(
    stdout: &mut impl Write,
    stderr: &mut impl Write,
    output: &str,
    metrics: Option<&str>,
    json: bool,
) -> Result<()> {
    writeln!(stdout, "{output}")?;
    if let Some(metrics) = metrics {
        if json {
            writeln!(stderr, "{metrics}")?;
        } else {
            writeln!(stdout, "{metrics}")?;
        }
    }
    Ok(())
}

fn render<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text())
    }
}

fn stop_on_ctrl_c(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received SIGINT, stopping batch after the current run");
                stop.store(true, Ordering::Relaxed);
            }
            Err(err) => tracing::warn!(error = %err, "failed to install SIGINT handler"),
        }
    });
}

#[cfg(test)]
mod tests {
    use gateway::{FaultCategory, FaultSetting};

    use super::*;

    fn harness() -> Harness<InMemoryGateway> {
        Harness::new(InMemoryGateway::new(), RequestBuilder::default())
    }

    async fn exec(
        harness: &mut Harness<InMemoryGateway>,
        command: Command,
        json: bool,
    ) -> Result<String> {
        let config = CliConfig {
            batch_size: 3,
            ..CliConfig::default()
        };
        execute(harness, &command, &config, json, &AtomicBool::new(false)).await
    }

    #[tokio::test]
    async fn test_single_renders_result() {
        let mut harness = harness();
        let out = exec(
            &mut harness,
            Command::Single {
                pattern: "saga".to_string(),
            },
            false,
        )
        .await
        .unwrap();
        assert!(out.starts_with("Saga SUCCESS"));
    }

    #[tokio::test]
    async fn test_single_rejects_unknown_pattern() {
        let mut harness = harness();
        let err = exec(
            &mut harness,
            Command::Single {
                pattern: "3pc".to_string(),
            },
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Harness(HarnessError::InvalidPattern(_))));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(harness.client().call_count(Pattern::Saga), 0);
    }

    #[tokio::test]
    async fn test_compare_json_contains_both_results() {
        let mut harness = harness();
        let out = exec(&mut harness, Command::Compare, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["saga"]["pattern"], "Saga");
        assert_eq!(value["tpc"]["success"], true);
    }

    #[tokio::test]
    async fn test_batch_uses_configured_size() {
        let mut harness = harness();
        let out = exec(&mut harness, Command::Batch { count: None }, false)
            .await
            .unwrap();
        assert!(out.contains("Saga batch: 3/3 runs"));
        assert_eq!(harness.client().call_count(Pattern::TwoPhaseCommit), 3);
    }

    #[tokio::test]
    async fn test_batch_stops_when_flag_is_set() {
        let mut harness = harness();
        let config = CliConfig {
            batch_size: 5,
            ..CliConfig::default()
        };
        let stop = AtomicBool::new(true);
        let batch = Command::Batch { count: None };
        let out = execute(&mut harness, &batch, &config, false, &stop)
            .await
            .unwrap();
        assert!(out.contains("Saga batch: 1/5 runs (stopped)"));
        assert_eq!(harness.client().call_count(Pattern::TwoPhaseCommit), 0);
    }

    #[tokio::test]
    async fn test_zero_batch_is_a_local_error() {
        let mut harness = harness();
        let config = CliConfig {
            batch_size: 0,
            ..CliConfig::default()
        };
        let err = execute(
            &mut harness,
            &Command::Batch { count: Some(0) },
            &config,
            false,
            &AtomicBool::new(false),
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_config_set_then_status() {
        let mut harness = harness();
        let set = Command::Config {
            action: ConfigAction::Set {
                category: FaultCategory::Fina,
                setting: FaultSetting::Availability,
                state: Switch::Off,
            },
        };
        let out = exec(&mut harness, set, false).await.unwrap();
        assert!(out.contains("disabled"));

        let out = exec(
            &mut harness,
            Command::Config {
                action: ConfigAction::Status,
            },
            true,
        )
        .await
        .unwrap();
        let status: gateway::ConfigStatus = serde_json::from_str(&out).unwrap();
        let toggle = FaultToggle::new(FaultCategory::Fina, FaultSetting::Availability).unwrap();
        assert_eq!(status.is_enabled(toggle), Some(false));
    }

    #[tokio::test]
    async fn test_config_set_rejects_invalid_pair() {
        let mut harness = harness();
        let set = Command::Config {
            action: ConfigAction::Set {
                category: FaultCategory::Carrier,
                setting: FaultSetting::PreAuthorization,
                state: Switch::On,
            },
        };
        let err = exec(&mut harness, set, false).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    const METRICS: &str = "# TYPE harness_invocations_total counter";

    #[tokio::test]
    async fn test_json_output_stays_parsable_with_metrics() {
        let mut harness = harness();
        let report = exec(&mut harness, Command::Compare, true).await.unwrap();

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        write_output(&mut stdout, &mut stderr, &report, Some(METRICS), true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(value["saga"]["success"], true);
        assert_eq!(String::from_utf8(stderr).unwrap().trim(), METRICS);
    }

    #[test]
    fn test_text_output_appends_metrics() {
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        write_output(&mut stdout, &mut stderr, "report", Some(METRICS), false).unwrap();

        assert_eq!(String::from_utf8(stdout).unwrap(), format!("report\n{METRICS}\n"));
        assert!(stderr.is_empty());
    }
}
