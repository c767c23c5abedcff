//! Shared types for the transaction pattern benchmark.
//!
//! These types describe what is sent to the order gateway and what the
//! harness records for every protocol invocation.

pub mod order;
pub mod pattern;
pub mod result;
pub mod types;

pub use order::{OrderItem, OrderRequest};
pub use pattern::{ParsePatternError, Pattern};
pub use result::{ProtocolResult, Recovery};
pub use types::SessionId;
