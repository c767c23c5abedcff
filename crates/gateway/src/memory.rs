//! Scripted in-memory gateway for tests and offline runs.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderRequest, Pattern};

use crate::client::GatewayClient;
use crate::error::{GatewayError, Result};
use crate::faults::{
    CategoryStatus, ConfigStatus, FaultCategory, FaultSetting, FaultToggle, ToggleAck,
};
use crate::response::PlaceOrderResponse;

/// One scripted reaction to a place-order call.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer with this body after the given delay.
    Respond {
        response: PlaceOrderResponse,
        delay: Duration,
    },
    /// Fail at the transport level with this description.
    Unreachable(String),
}

impl Scripted {
    /// Answers immediately with `response`.
    pub fn respond(response: PlaceOrderResponse) -> Self {
        Scripted::Respond {
            response,
            delay: Duration::ZERO,
        }
    }

    /// Answers with `response` after `delay`.
    pub fn respond_after(response: PlaceOrderResponse, delay: Duration) -> Self {
        Scripted::Respond { response, delay }
    }

    /// Fails with a transport error.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Scripted::Unreachable(reason.into())
    }
}

#[derive(Debug)]
struct InMemoryGatewayState {
    scripts: HashMap<Pattern, VecDeque<Scripted>>,
    requests: Vec<(Pattern, OrderRequest)>,
    toggles: BTreeMap<FaultToggle, bool>,
    latency: Duration,
    next_order_id: i64,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        let toggles = [
            (FaultCategory::Fina, FaultSetting::Availability),
            (FaultCategory::Fina, FaultSetting::PreAuthorization),
            (FaultCategory::Carrier, FaultSetting::Availability),
            (FaultCategory::Carrier, FaultSetting::Capacity),
        ]
        .into_iter()
        .filter_map(|(category, setting)| FaultToggle::new(category, setting).ok())
        .map(|toggle| (toggle, true))
        .collect();

        Self {
            scripts: HashMap::new(),
            requests: Vec::new(),
            toggles,
            latency: Duration::ZERO,
            next_order_id: 0,
        }
    }
}

/// In-memory gateway.
///
/// Scripted reactions are consumed first, per pattern, in the order they
/// were queued. Once a pattern's script is exhausted the gateway simulates
/// the backend: orders succeed unless a fault toggle is switched off, in
/// which case the Saga compensates and the 2PC coordinator aborts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway with every toggle enabled.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues a reaction for the next unscripted call of `pattern`.
    pub fn script(&self, pattern: Pattern, reaction: Scripted) {
        self.state()
            .scripts
            .entry(pattern)
            .or_default()
            .push_back(reaction);
    }

    /// Sets the delay applied to simulated (unscripted) responses.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Returns every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<(Pattern, OrderRequest)> {
        self.state().requests.clone()
    }

    /// Returns the number of place-order calls received for `pattern`.
    pub fn call_count(&self, pattern: Pattern) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|(p, _)| *p == pattern)
            .count()
    }

    /// Returns true if the toggle is currently enabled.
    pub fn is_enabled(&self, toggle: FaultToggle) -> bool {
        self.state().toggles.get(&toggle).copied().unwrap_or(true)
    }

    fn simulate(state: &mut InMemoryGatewayState, pattern: Pattern) -> PlaceOrderResponse {
        state.next_order_id += 1;
        let order_id = state.next_order_id;

        let payment_ok = state
            .toggles
            .iter()
            .filter(|(toggle, _)| toggle.category() == FaultCategory::Fina)
            .all(|(_, enabled)| *enabled);
        let shipping_ok = state
            .toggles
            .iter()
            .filter(|(toggle, _)| toggle.category() == FaultCategory::Carrier)
            .all(|(_, enabled)| *enabled);

        let mut response = PlaceOrderResponse {
            order_id: Some(order_id),
            total_amount: Some(2599.97),
            order_latency: Some(10),
            payment_latency: Some(20),
            shipping_latency: Some(30),
            abort_latency: Some(0),
            compensations: Some(0),
            global_2pc_rollbacks: Some(0),
            ..PlaceOrderResponse::default()
        };
        if pattern.has_prepare_phase() {
            response.prepare_latency = Some(60);
            response.commit_latency = Some(0);
        }

        // Steps completed before the failing one are the ones undone.
        let undone = match (payment_ok, shipping_ok) {
            (true, true) => None,
            (false, _) => Some((1, "Payment failed")),
            (true, false) => Some((2, "Shipment creation failed")),
        };

        match undone {
            None => {
                response.success = true;
                response.message = Some("Order placed successfully".to_string());
                response.order_status = Some("CONFIRMED".to_string());
                response.payment_id = Some(order_id);
                response.payment_status = Some("COMPLETED".to_string());
                response.transaction_id = Some(format!("TX-{order_id:06}"));
                response.shipment_id = Some(order_id);
                response.shipment_status = Some("CREATED".to_string());
                response.tracking_number = Some(format!("GLS-{order_id:06}"));
                if pattern.has_prepare_phase() {
                    response.commit_latency = Some(15);
                }
            }
            Some((steps, reason)) => {
                response.message = Some(reason.to_string());
                response.order_status = Some("CANCELLED".to_string());
                response.abort_latency = Some(5);
                match pattern {
                    Pattern::Saga => response.compensations = Some(steps),
                    Pattern::TwoPhaseCommit => {
                        response.compensations = Some(steps + 1);
                        response.global_2pc_rollbacks = Some(1);
                    }
                }
            }
        }

        response
    }
}

#[async_trait]
impl GatewayClient for InMemoryGateway {
    async fn place_order(
        &self,
        pattern: Pattern,
        request: &OrderRequest,
    ) -> Result<PlaceOrderResponse> {
        let (reaction, latency) = {
            let mut state = self.state();
            state.requests.push((pattern, request.clone()));
            let scripted = state
                .scripts
                .get_mut(&pattern)
                .and_then(|queue| queue.pop_front());
            let reaction = match scripted {
                Some(reaction) => reaction,
                None => Scripted::respond(Self::simulate(&mut state, pattern)),
            };
            (reaction, state.latency)
        };

        match reaction {
            Scripted::Respond { response, delay } => {
                let delay = if delay.is_zero() { latency } else { delay };
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Scripted::Unreachable(reason) => Err(GatewayError::Unreachable(reason)),
        }
    }

    async fn config_status(&self) -> Result<ConfigStatus> {
        let state = self.state();
        let mut fina = BTreeMap::new();
        let mut carrier = BTreeMap::new();
        for (toggle, enabled) in &state.toggles {
            let target = match toggle.category() {
                FaultCategory::Fina => &mut fina,
                FaultCategory::Carrier => &mut carrier,
            };
            target.insert(toggle.status_key().to_string(), *enabled);
        }
        Ok(ConfigStatus {
            fina: CategoryStatus::Toggles(fina),
            carrier: CategoryStatus::Toggles(carrier),
        })
    }

    async fn set_toggle(&self, toggle: FaultToggle, enabled: bool) -> Result<ToggleAck> {
        self.state().toggles.insert(toggle, enabled);
        let verdict = if enabled { "PASS" } else { "FAIL" };
        Ok(ToggleAck {
            setting: toggle.status_key().trim_end_matches("Enabled").to_string(),
            enabled,
            message: Some(format!("{toggle} validation will {verdict}")),
        })
    }
}
