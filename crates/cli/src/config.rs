//! Runner configuration loaded from environment variables.

use harness::DEFAULT_BATCH_SIZE;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Runner configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `GATEWAY_URL`: gateway base URL (default: `"http://localhost:8080"`)
/// - `BATCH_SIZE`: runs per pattern in a batch (default: `20`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub gateway_url: String,
    pub batch_size: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            gateway_url: lookup("GATEWAY_URL").unwrap_or(defaults.gateway_url),
            batch_size: lookup("BATCH_SIZE")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.batch_size),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.log_format),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8080".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}
