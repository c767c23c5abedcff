//! Normalized outcome of a single protocol invocation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// How a pattern recovered from a failure.
///
/// Saga results always report a compensation count; two-phase commit
/// results always report whether a global rollback happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Recovery {
    /// Number of compensating actions the saga executed.
    Compensations(u32),

    /// Whether the coordinator aborted the transaction.
    GlobalRollback(bool),
}

impl Recovery {
    /// Returns the recovery of a result that never reached the gateway.
    pub fn none_for(pattern: Pattern) -> Self {
        match pattern {
            Pattern::Saga => Recovery::Compensations(0),
            Pattern::TwoPhaseCommit => Recovery::GlobalRollback(false),
        }
    }

    /// Returns true if any recovery work was reported.
    pub fn occurred(&self) -> bool {
        match self {
            Recovery::Compensations(n) => *n > 0,
            Recovery::GlobalRollback(rolled_back) => *rolled_back,
        }
    }
}

impl std::fmt::Display for Recovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recovery::Compensations(n) => write!(f, "{n} compensation(s)"),
            Recovery::GlobalRollback(true) => write!(f, "global rollback"),
            Recovery::GlobalRollback(false) => write!(f, "none"),
        }
    }
}

/// Outcome and timings of one gateway call.
///
/// Latencies are in milliseconds. `total_latency` is measured by the
/// client and is zero when the call failed at the transport level, in
/// which case every service latency is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolResult {
    pub pattern: Pattern,
    pub success: bool,

    pub order_id: Option<i64>,
    pub order_status: Option<String>,
    pub payment_id: Option<i64>,
    pub payment_status: Option<String>,
    pub transaction_id: Option<String>,
    pub shipment_id: Option<i64>,
    pub shipment_status: Option<String>,
    pub tracking_number: Option<String>,
    pub total_amount: Option<f64>,

    pub order_latency: Option<u64>,
    pub payment_latency: Option<u64>,
    pub shipping_latency: Option<u64>,
    pub abort_latency: Option<u64>,
    /// Only ever set on two-phase commit results.
    pub prepare_latency: Option<u64>,
    /// Only ever set on two-phase commit results.
    pub commit_latency: Option<u64>,

    pub compensations: u32,
    pub recovery: Recovery,
    pub total_latency: u64,

    pub message: Option<String>,
    pub error_details: Option<String>,
    /// Gateway-side completion time, when reported.
    pub timestamp: Option<NaiveDateTime>,
}

impl ProtocolResult {
    /// Builds the result of a call that never produced a decodable response.
    pub fn transport_failure(pattern: Pattern, message: impl Into<String>) -> Self {
        Self {
            pattern,
            success: false,
            order_id: None,
            order_status: None,
            payment_id: None,
            payment_status: None,
            transaction_id: None,
            shipment_id: None,
            shipment_status: None,
            tracking_number: None,
            total_amount: None,
            order_latency: None,
            payment_latency: None,
            shipping_latency: None,
            abort_latency: None,
            prepare_latency: None,
            commit_latency: None,
            compensations: 0,
            recovery: Recovery::none_for(pattern),
            total_latency: 0,
            message: Some(message.into()),
            error_details: None,
            timestamp: None,
        }
    }

    /// Returns true if no service latency was reported at all.
    pub fn is_transport_failure(&self) -> bool {
        !self.success
            && self.total_latency == 0
            && self.order_latency.is_none()
            && self.payment_latency.is_none()
            && self.shipping_latency.is_none()
            && self.abort_latency.is_none()
    }

    /// Returns true if the coordinator had to undo work.
    pub fn rolled_back(&self) -> bool {
        self.recovery.occurred()
    }
}
