//! Reduction of a batch into summary metrics.

use common::{Pattern, ProtocolResult, Recovery};
use serde::{Deserialize, Serialize};

use crate::batch::BatchRun;

/// Mean of one latency field across a batch.
///
/// `mean` counts a missing value as zero and divides by every run, so it
/// understates phases that do not apply to every run. `defined_mean`
/// averages only the runs that reported the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMean {
    pub mean: f64,
    pub defined_mean: Option<f64>,
    /// Number of runs that reported the field.
    pub defined: usize,
}

impl FieldMean {
    fn of(results: &[&ProtocolResult], field: impl Fn(&ProtocolResult) -> Option<u64>) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        // Gateway-reported values are unbounded, so sum wider than u64.
        let (sum, defined) = results
            .iter()
            .filter_map(|r| field(r))
            .fold((0u128, 0usize), |(sum, n), v| (sum + u128::from(v), n + 1));
        let sum = sum as f64;

        Self {
            mean: sum / results.len() as f64,
            defined_mean: (defined > 0).then(|| sum / defined as f64),
            defined,
        }
    }
}

/// Summary of one batch.
///
/// Latencies are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub pattern: Pattern,
    pub runs: usize,
    pub successes: usize,
    pub failures: usize,
    /// Percentage of successful runs, rounded half up.
    pub success_rate: u32,
    /// Sum of client-measured latency over every run.
    pub total_batch_time: u64,

    pub total_latency: FieldMean,
    pub order_latency: FieldMean,
    pub payment_latency: FieldMean,
    pub shipping_latency: FieldMean,
    pub abort_latency: FieldMean,
    pub prepare_latency: FieldMean,
    pub commit_latency: FieldMean,

    pub avg_compensations: f64,
    /// Two-phase commit runs that ended in a global rollback.
    pub rollbacks: usize,
    pub min_total_latency: Option<u64>,
    pub max_total_latency: Option<u64>,
}

impl AggregateMetrics {
    /// Metrics of a batch that captured no runs.
    pub fn empty(pattern: Pattern) -> Self {
        Self {
            pattern,
            runs: 0,
            successes: 0,
            failures: 0,
            success_rate: 0,
            total_batch_time: 0,
            total_latency: FieldMean::default(),
            order_latency: FieldMean::default(),
            payment_latency: FieldMean::default(),
            shipping_latency: FieldMean::default(),
            abort_latency: FieldMean::default(),
            prepare_latency: FieldMean::default(),
            commit_latency: FieldMean::default(),
            avg_compensations: 0.0,
            rollbacks: 0,
            min_total_latency: None,
            max_total_latency: None,
        }
    }

    /// Average throughput implied by the serialized batch, in runs per second.
    pub fn throughput(&self) -> Option<f64> {
        (self.total_batch_time > 0)
            .then(|| self.runs as f64 * 1000.0 / self.total_batch_time as f64)
    }
}

/// Computes the summary metrics of a batch.
///
/// Never fails: an empty batch yields all-zero metrics.
pub fn aggregate(batch: &BatchRun) -> AggregateMetrics {
    let results: Vec<&ProtocolResult> = batch.results().collect();
    let runs = results.len();
    if runs == 0 {
        return AggregateMetrics::empty(batch.pattern());
    }

    let successes = results.iter().filter(|r| r.success).count();
    let total_batch_time = results
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.total_latency));
    let compensations = results
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(u64::from(r.compensations)));
    let rollbacks = results
        .iter()
        .filter(|r| matches!(r.recovery, Recovery::GlobalRollback(true)))
        .count();
    let successful_latencies = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.total_latency);

    AggregateMetrics {
        pattern: batch.pattern(),
        runs,
        successes,
        failures: runs - successes,
        success_rate: success_rate(successes, runs),
        total_batch_time,
        total_latency: FieldMean::of(&results, |r| Some(r.total_latency)),
        order_latency: FieldMean::of(&results, |r| r.order_latency),
        payment_latency: FieldMean::of(&results, |r| r.payment_latency),
        shipping_latency: FieldMean::of(&results, |r| r.shipping_latency),
        abort_latency: FieldMean::of(&results, |r| r.abort_latency),
        prepare_latency: FieldMean::of(&results, |r| r.prepare_latency),
        commit_latency: FieldMean::of(&results, |r| r.commit_latency),
        avg_compensations: compensations as f64 / runs as f64,
        rollbacks,
        min_total_latency: successful_latencies.clone().min(),
        max_total_latency: successful_latencies.max(),
    }
}

/// `round(100 * successes / runs)` with halves rounded up, 0 for no runs.
fn success_rate(successes: usize, runs: usize) -> u32 {
    if runs == 0 {
        return 0;
    }
    let rate = (200 * successes + runs) / (2 * runs);
    u32::try_from(rate).unwrap_or(100)
}
