//! Comparative benchmarking harness for Saga and Two-Phase Commit.
//!
//! The harness drives the order gateway and reports what it observes:
//! 1. [`RequestBuilder`] turns an [`OrderProfile`] into the order payload
//! 2. [`ProtocolInvoker`] times one call and normalizes its outcome
//! 3. [`ComparisonEngine`] pairs one call per pattern, [`BatchRunner`]
//!    drives sequential batches
//! 4. [`aggregate`] reduces a batch to averaged metrics
//!
//! [`Harness`] ties these together behind a small state machine and
//! publishes an immutable snapshot after every step.

pub mod aggregate;
pub mod batch;
pub mod compare;
pub mod error;
pub mod invoker;
pub mod request;
pub mod session;
pub mod state;

pub use aggregate::{AggregateMetrics, FieldMean, aggregate};
pub use batch::{
    BatchEntry, BatchProgress, BatchRun, BatchRunner, DEFAULT_BATCH_SIZE, PairedBatch,
};
pub use compare::{ComparisonEngine, ComparisonReport};
pub use error::{HarnessError, Result};
pub use invoker::{ProtocolInvoker, normalize};
pub use request::{OrderProfile, RequestBuilder};
pub use session::Harness;
pub use state::{HarnessSnapshot, HarnessStatus, RunLogEntry, RunMode};
