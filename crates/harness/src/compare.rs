//! Single-sample side-by-side comparison.

use common::{Pattern, ProtocolResult};
use gateway::GatewayClient;
use serde::{Deserialize, Serialize};

use crate::invoker::ProtocolInvoker;
use crate::request::RequestBuilder;

/// One unaggregated result per pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub saga: ProtocolResult,
    pub tpc: ProtocolResult,
}

impl ComparisonReport {
    pub fn get(&self, pattern: Pattern) -> &ProtocolResult {
        match pattern {
            Pattern::Saga => &self.saga,
            Pattern::TwoPhaseCommit => &self.tpc,
        }
    }

    /// 2PC total latency minus Saga total latency, in milliseconds.
    pub fn latency_delta(&self) -> i64 {
        self.tpc.total_latency as i64 - self.saga.total_latency as i64
    }

    /// Both patterns succeeded with the same total latency.
    pub fn is_tie(&self) -> bool {
        self.saga.success && self.tpc.success && self.saga.total_latency == self.tpc.total_latency
    }

    /// The pattern with the lower total latency among successful results.
    ///
    /// `None` when either failed or on a tie.
    pub fn faster(&self) -> Option<Pattern> {
        if !(self.saga.success && self.tpc.success) {
            return None;
        }
        match self.saga.total_latency.cmp(&self.tpc.total_latency) {
            std::cmp::Ordering::Less => Some(Pattern::Saga),
            std::cmp::Ordering::Greater => Some(Pattern::TwoPhaseCommit),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Places one order per pattern and pairs the outcomes.
pub struct ComparisonEngine<'a, G> {
    invoker: &'a ProtocolInvoker<G>,
    builder: &'a RequestBuilder,
}

impl<'a, G: GatewayClient> ComparisonEngine<'a, G> {
    pub fn new(invoker: &'a ProtocolInvoker<G>, builder: &'a RequestBuilder) -> Self {
        Self { invoker, builder }
    }

    /// Invokes Saga, then 2PC, with the same payload.
    #[tracing::instrument(skip(self))]
    pub async fn compare(&self) -> ComparisonReport {
        let request = self.builder.build();
        let saga = self.invoker.invoke(Pattern::Saga, &request).await;
        let tpc = self.invoker.invoke(Pattern::TwoPhaseCommit, &request).await;

        tracing::info!(
            saga_ms = saga.total_latency,
            tpc_ms = tpc.total_latency,
            saga_success = saga.success,
            tpc_success = tpc.success,
            "comparison captured"
        );

        ComparisonReport { saga, tpc }
    }
}
