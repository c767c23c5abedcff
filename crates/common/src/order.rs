//! Order payload sent to the gateway.

use serde::{Deserialize, Serialize};

/// A single ordered product line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalog product identifier.
    pub product_id: i64,
    /// Number of units ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order line.
    pub fn new(product_id: i64, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// The order placed by every protocol invocation.
///
/// Field order is fixed so that the same request always serializes to the
/// same bytes, and item order is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub payment_provider: String,
    pub card_last_four_digits: String,
    pub carrier: String,
    pub order_items: Vec<OrderItem>,
}

impl OrderRequest {
    /// Returns the total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.order_items
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }
}
