//! Wire shape of the gateway's place-order responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Body returned by both place-order endpoints.
///
/// The same shape is used for successful and failed orders; failed orders
/// come back with a 5xx status and `success: false`. Every field is
/// optional on the wire so partial bodies still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub message: Option<String>,

    pub order_id: Option<i64>,
    pub order_status: Option<String>,
    pub total_amount: Option<f64>,

    pub payment_id: Option<i64>,
    pub payment_status: Option<String>,
    pub transaction_id: Option<String>,

    pub shipment_id: Option<i64>,
    pub shipment_status: Option<String>,
    pub tracking_number: Option<String>,

    pub timestamp: Option<NaiveDateTime>,
    pub error_details: Option<String>,

    #[serde(deserialize_with = "latency")]
    pub order_latency: Option<u64>,
    #[serde(deserialize_with = "latency")]
    pub payment_latency: Option<u64>,
    #[serde(deserialize_with = "latency")]
    pub shipping_latency: Option<u64>,
    #[serde(deserialize_with = "latency")]
    pub total_latency: Option<u64>,
    pub compensations: Option<u32>,
    #[serde(deserialize_with = "latency")]
    pub prepare_latency: Option<u64>,
    #[serde(deserialize_with = "latency")]
    pub commit_latency: Option<u64>,
    #[serde(deserialize_with = "latency")]
    pub abort_latency: Option<u64>,
    #[serde(rename = "global2pcRollbacks")]
    pub global_2pc_rollbacks: Option<u32>,
}

/// Latencies are signed longs on the wire, computed from a wall clock that
/// can step backwards. Negative values read as 0.
fn latency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<i128>::deserialize(deserializer)?;
    Ok(value.map(|ms| {
        if ms < 0 {
            tracing::warn!(latency_ms = %ms, "negative latency reported, using 0");
        }
        u64::try_from(ms.max(0)).unwrap_or(u64::MAX)
    }))
}
