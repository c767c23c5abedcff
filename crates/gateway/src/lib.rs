//! Client side of the order gateway boundary.
//!
//! The gateway fronts the order, payment and shipping services and exposes
//! one endpoint per distributed transaction pattern, plus a small set of
//! fault-injection toggles used to force failures in those services.
//!
//! Two implementations of [`GatewayClient`] are provided:
//! - [`HttpGatewayClient`] talks to a running gateway over HTTP
//! - [`InMemoryGateway`] is a scripted stand-in for tests and dry runs

pub mod client;
pub mod error;
pub mod faults;
pub mod http;
pub mod memory;
pub mod response;

pub use client::GatewayClient;
pub use error::{GatewayError, Result};
pub use faults::{
    CategoryStatus, ConfigStatus, FaultCategory, FaultSetting, FaultToggle, ToggleAck,
};
pub use http::HttpGatewayClient;
pub use memory::{InMemoryGateway, Scripted};
pub use response::PlaceOrderResponse;
