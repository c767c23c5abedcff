//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gateway::{FaultCategory, FaultSetting};

use crate::config::{CliConfig, LogFormat};

/// Benchmarks the Saga and 2PC order placement endpoints of the gateway.
#[derive(Debug, Parser)]
#[command(name = "txbench", version, about)]
pub struct Cli {
    /// Gateway base URL (overrides GATEWAY_URL).
    #[arg(long, global = true)]
    pub gateway_url: Option<String>,

    /// Print the report as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print Prometheus metrics after the command.
    #[arg(long, global = true)]
    pub emit_metrics: bool,

    /// JSON order profile used as the request payload.
    #[arg(long, global = true)]
    pub order_file: Option<PathBuf>,

    /// Run against the built-in simulated gateway instead of HTTP.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log output format (overrides LOG_FORMAT).
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Place one order through a single pattern.
    Single {
        /// saga, 2pc, tpc or two-phase-commit
        pattern: String,
    },
    /// Place the same order through Saga, then 2PC.
    Compare,
    /// Run a Saga batch followed by a 2PC batch.
    Batch {
        /// Runs per pattern (overrides BATCH_SIZE).
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },
    /// Inspect or change the gateway's fault-injection toggles.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the current toggle values.
    Status,
    /// Turn one toggle on or off.
    Set {
        /// fina or carrier
        category: FaultCategory,
        /// availability, pre-authorization or capacity
        setting: FaultSetting,
        state: Switch,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

impl Cli {
    /// Applies command-line overrides on top of the environment configuration.
    pub fn apply(&self, mut config: CliConfig) -> CliConfig {
        if let Some(url) = &self.gateway_url {
            config.gateway_url = url.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Command::Batch { count: Some(count) } = self.command {
            config.batch_size = count;
        }
        config
    }
}
