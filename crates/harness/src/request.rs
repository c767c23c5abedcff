//! Order payload construction.

use std::path::Path;

use common::{OrderItem, OrderRequest};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Configuration of the order every invocation places.
///
/// `quantity_scale` multiplies every line's quantity, which makes it easy
/// to benchmark heavier orders without editing the item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProfile {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub payment_provider: String,
    pub card_last_four_digits: String,
    pub carrier: String,
    pub items: Vec<OrderItem>,
    #[serde(default = "default_quantity_scale")]
    pub quantity_scale: u32,
}

fn default_quantity_scale() -> u32 {
    1
}

impl Default for OrderProfile {
    /// The demo order: two laptops and one smartphone.
    fn default() -> Self {
        Self {
            customer_name: "John Doe".to_string(),
            customer_email: "john.doe@example.com".to_string(),
            shipping_address: "123 Main Street, New York, NY 10001".to_string(),
            payment_method: "CREDIT_CARD".to_string(),
            payment_provider: "FINA".to_string(),
            card_last_four_digits: "4242".to_string(),
            carrier: "GLS".to_string(),
            items: vec![OrderItem::new(1, 2), OrderItem::new(2, 1)],
            quantity_scale: 1,
        }
    }
}

impl OrderProfile {
    /// Loads a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| HarnessError::ProfileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks the fields the gateway requires.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("customerName", &self.customer_name),
            ("customerEmail", &self.customer_email),
            ("shippingAddress", &self.shipping_address),
            ("paymentMethod", &self.payment_method),
            ("carrier", &self.carrier),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(HarnessError::InvalidProfile(format!("{field} is required")));
        }
        if !self.customer_email.contains('@') {
            return Err(HarnessError::InvalidProfile(format!(
                "invalid customer email '{}'",
                self.customer_email
            )));
        }
        if self.items.is_empty() {
            return Err(HarnessError::InvalidProfile(
                "at least one order item is required".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(HarnessError::InvalidProfile(format!(
                "product {} has zero quantity",
                item.product_id
            )));
        }
        if self.quantity_scale == 0 {
            return Err(HarnessError::InvalidProfile(
                "quantityScale must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds the order payload from a validated profile.
///
/// Building is pure: the same profile always yields the same request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    profile: OrderProfile,
}

impl RequestBuilder {
    /// Creates a builder, rejecting profiles the gateway would refuse.
    pub fn new(profile: OrderProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Returns the profile the builder was created with.
    pub fn profile(&self) -> &OrderProfile {
        &self.profile
    }

    /// Builds the order request.
    pub fn build(&self) -> OrderRequest {
        let profile = &self.profile;
        OrderRequest {
            customer_name: profile.customer_name.clone(),
            customer_email: profile.customer_email.clone(),
            shipping_address: profile.shipping_address.clone(),
            payment_method: profile.payment_method.clone(),
            payment_provider: profile.payment_provider.clone(),
            card_last_four_digits: profile.card_last_four_digits.clone(),
            carrier: profile.carrier.clone(),
            order_items: profile
                .items
                .iter()
                .map(|item| {
                    OrderItem::new(
                        item.product_id,
                        item.quantity.saturating_mul(profile.quantity_scale),
                    )
                })
                .collect(),
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            profile: OrderProfile::default(),
        }
    }
}
