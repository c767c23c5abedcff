//! Timed, normalized protocol invocation.

use std::time::Duration;

use common::{OrderRequest, Pattern, ProtocolResult, Recovery};
use gateway::{GatewayClient, PlaceOrderResponse};
use tokio::time::Instant;

/// Calls the gateway for one pattern and always returns a result.
///
/// Transport failures, undecodable bodies and gateway-reported failures
/// all come back as a [`ProtocolResult`] with `success == false`.
#[derive(Debug, Clone)]
pub struct ProtocolInvoker<G> {
    client: G,
}

impl<G: GatewayClient> ProtocolInvoker<G> {
    /// Creates an invoker over the given gateway client.
    pub fn new(client: G) -> Self {
        Self { client }
    }

    /// Returns the underlying gateway client.
    pub fn client(&self) -> &G {
        &self.client
    }

    /// Places one order with `pattern` and measures the round trip.
    #[tracing::instrument(skip(self, request), fields(%pattern))]
    pub async fn invoke(&self, pattern: Pattern, request: &OrderRequest) -> ProtocolResult {
        let label = pattern.label();
        metrics::counter!("harness_invocations_total", "pattern" => label).increment(1);

        let start = Instant::now();
        let result = match self.client.place_order(pattern, request).await {
            Ok(response) => normalize(pattern, response, start.elapsed()),
            Err(e) => {
                tracing::warn!(error = %e, "gateway call failed");
                ProtocolResult::transport_failure(pattern, format!("Error: {e}"))
            }
        };

        if !result.success {
            metrics::counter!("harness_invocation_failures_total", "pattern" => label)
                .increment(1);
        }
        metrics::histogram!("harness_invocation_latency_ms", "pattern" => label)
            .record(result.total_latency as f64);

        result
    }
}

/// Converts a decoded gateway response into a [`ProtocolResult`].
///
/// `elapsed` replaces whatever total latency the gateway reported.
/// Prepare and commit latencies are kept only for two-phase commit.
pub fn normalize(
    pattern: Pattern,
    response: PlaceOrderResponse,
    elapsed: Duration,
) -> ProtocolResult {
    let compensations = response.compensations.unwrap_or(0);
    let recovery = match pattern {
        Pattern::Saga => Recovery::Compensations(compensations),
        Pattern::TwoPhaseCommit => Recovery::GlobalRollback(
            !response.success || response.global_2pc_rollbacks.unwrap_or(0) > 0,
        ),
    };
    let (prepare_latency, commit_latency) = if pattern.has_prepare_phase() {
        (response.prepare_latency, response.commit_latency)
    } else {
        (None, None)
    };
    let message = match response.message {
        Some(message) => Some(message),
        None if !response.success => {
            Some(format!("Failed to place order with {}", pattern.label()))
        }
        None => None,
    };

    ProtocolResult {
        pattern,
        success: response.success,
        order_id: response.order_id,
        order_status: response.order_status,
        payment_id: response.payment_id,
        payment_status: response.payment_status,
        transaction_id: response.transaction_id,
        shipment_id: response.shipment_id,
        shipment_status: response.shipment_status,
        tracking_number: response.tracking_number,
        total_amount: response.total_amount,
        order_latency: response.order_latency,
        payment_latency: response.payment_latency,
        shipping_latency: response.shipping_latency,
        abort_latency: response.abort_latency,
        prepare_latency,
        commit_latency,
        compensations,
        recovery,
        total_latency: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        message,
        error_details: response.error_details,
        timestamp: response.timestamp,
    }
}
