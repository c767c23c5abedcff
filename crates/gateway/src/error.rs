//! Gateway client error types.

use thiserror::Error;

use crate::faults::{FaultCategory, FaultSetting};

/// Errors raised while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway could not be reached at all.
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    /// The response body was not the expected JSON document.
    #[error("HTTP {status}: invalid response body: {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The gateway answered with a non-success status.
    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The category does not expose the requested toggle.
    #[error("Invalid fault toggle: {category} has no '{setting}' setting")]
    InvalidToggle {
        category: FaultCategory,
        setting: FaultSetting,
    },

    /// The configured gateway base URL is not a valid URL.
    #[error("Invalid gateway URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
