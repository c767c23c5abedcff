//! Harness error types.

use std::path::PathBuf;

use common::ParsePatternError;
use gateway::GatewayError;
use thiserror::Error;

/// Local errors raised by the harness.
///
/// Failed gateway calls are never reported here; they are recorded as
/// unsuccessful results instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A batch must contain at least one run.
    #[error("Invalid batch size {0}: a batch needs at least one run")]
    InvalidBatchSize(usize),

    /// The pattern name is not recognised.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] ParsePatternError),

    /// The order profile would be rejected by the gateway.
    #[error("Invalid order profile: {0}")]
    InvalidProfile(String),

    /// The order profile file could not be read.
    #[error("Failed to read order profile {path}: {source}")]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The order profile file is not valid JSON.
    #[error("Failed to parse order profile: {0}")]
    ProfileFormat(#[from] serde_json::Error),

    /// A fault-injection call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Convenience type alias for harness results.
pub type Result<T> = std::result::Result<T, HarnessError>;
