//! Gateway client trait.

use async_trait::async_trait;
use common::{OrderRequest, Pattern};

use crate::error::Result;
use crate::faults::{ConfigStatus, FaultToggle, ToggleAck};
use crate::response::PlaceOrderResponse;

/// Operations offered by the order gateway.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Places an order using the given transaction pattern.
    ///
    /// A decoded response is returned even when the gateway reports a
    /// failed order; only transport and decoding problems are errors.
    async fn place_order(
        &self,
        pattern: Pattern,
        request: &OrderRequest,
    ) -> Result<PlaceOrderResponse>;

    /// Reads the current fault-injection toggles.
    async fn config_status(&self) -> Result<ConfigStatus>;

    /// Switches a fault-injection toggle on or off.
    async fn set_toggle(&self, toggle: FaultToggle, enabled: bool) -> Result<ToggleAck>;
}

#[async_trait]
impl<T: GatewayClient + ?Sized> GatewayClient for std::sync::Arc<T> {
    async fn place_order(
        &self,
        pattern: Pattern,
        request: &OrderRequest,
    ) -> Result<PlaceOrderResponse> {
        (**self).place_order(pattern, request).await
    }

    async fn config_status(&self) -> Result<ConfigStatus> {
        (**self).config_status().await
    }

    async fn set_toggle(&self, toggle: FaultToggle, enabled: bool) -> Result<ToggleAck> {
        (**self).set_toggle(toggle, enabled).await
    }
}
