//! Runner error types with exit code mapping.

use gateway::GatewayError;
use harness::HarnessError;
use thiserror::Error;

/// Errors that end the runner with a non-zero exit code.
///
/// Failed orders are not errors; they are part of the report.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Failed to encode report: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
}

impl CliError {
    /// Returns 2 for invalid invocations and 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Harness(
                HarnessError::InvalidBatchSize(_)
                | HarnessError::InvalidPattern(_)
                | HarnessError::InvalidProfile(_)
                | HarnessError::ProfileIo { .. }
                | HarnessError::ProfileFormat(_),
            )
            | CliError::Gateway(
                GatewayError::InvalidUrl { .. } | GatewayError::InvalidToggle { .. },
            ) => 2,
            _ => 1,
        }
    }
}

/// Convenience type alias for runner results.
pub type Result<T> = std::result::Result<T, CliError>;
