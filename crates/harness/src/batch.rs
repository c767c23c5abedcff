//! Sequential batch execution.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use common::{Pattern, ProtocolResult};
use gateway::GatewayClient;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::invoker::ProtocolInvoker;
use crate::request::RequestBuilder;

/// Number of runs per pattern when no size is configured.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// One captured run of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    /// 1-based position of the run within its batch.
    pub run_index: usize,
    pub result: ProtocolResult,
}

/// Ordered, append-only record of one pattern's batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRun {
    pattern: Pattern,
    planned: usize,
    started_at: DateTime<Utc>,
    entries: Vec<BatchEntry>,
}

impl BatchRun {
    /// Starts an empty batch of `planned` runs.
    pub fn new(pattern: Pattern, planned: usize) -> Self {
        Self {
            pattern,
            planned,
            started_at: Utc::now(),
            entries: Vec::with_capacity(planned),
        }
    }

    /// Builds a complete batch from already captured results.
    pub fn from_results(
        pattern: Pattern,
        results: impl IntoIterator<Item = ProtocolResult>,
    ) -> Self {
        let mut batch = Self::new(pattern, 0);
        for result in results {
            batch.push(result);
        }
        batch.planned = batch.entries.len();
        batch
    }

    /// Same batch header with no runs captured yet.
    pub(crate) fn without_entries(&self) -> Self {
        Self {
            entries: Vec::with_capacity(self.planned),
            ..*self
        }
    }

    pub(crate) fn push(&mut self, result: ProtocolResult) -> &BatchEntry {
        let run_index = self.entries.len() + 1;
        self.entries.push(BatchEntry { run_index, result });
        &self.entries[run_index - 1]
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Number of runs the batch was started with.
    pub fn planned(&self) -> usize {
        self.planned
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Captured runs, ordered by run index.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn results(&self) -> impl Iterator<Item = &ProtocolResult> {
        self.entries.iter().map(|entry| &entry.result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true once every planned run has been captured.
    pub fn is_complete(&self) -> bool {
        self.entries.len() == self.planned
    }

    pub fn successes(&self) -> usize {
        self.results().filter(|result| result.success).count()
    }
}

/// View handed to progress callbacks after every captured run.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    pub batch: &'a BatchRun,
    pub latest: &'a BatchEntry,
}

impl BatchProgress<'_> {
    pub fn pattern(&self) -> Pattern {
        self.batch.pattern()
    }

    pub fn completed(&self) -> usize {
        self.batch.len()
    }

    pub fn planned(&self) -> usize {
        self.batch.planned()
    }
}

/// One batch per pattern, Saga first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedBatch {
    pub saga: BatchRun,
    pub tpc: BatchRun,
}

impl PairedBatch {
    pub fn get(&self, pattern: Pattern) -> &BatchRun {
        match pattern {
            Pattern::Saga => &self.saga,
            Pattern::TwoPhaseCommit => &self.tpc,
        }
    }
}

/// Drives batches of invocations, one call at a time.
///
/// Each call completes before the next one starts so that the measured
/// latencies are not skewed by overlapping load on the shared backend.
/// A failed run never aborts the batch.
pub struct BatchRunner<'a, G> {
    invoker: &'a ProtocolInvoker<G>,
    builder: &'a RequestBuilder,
}

impl<'a, G: GatewayClient> BatchRunner<'a, G> {
    pub fn new(invoker: &'a ProtocolInvoker<G>, builder: &'a RequestBuilder) -> Self {
        Self { invoker, builder }
    }

    /// Runs `count` invocations of `pattern`.
    pub async fn run(&self, pattern: Pattern, count: usize) -> Result<BatchRun> {
        self.run_with_progress(pattern, count, |_| ControlFlow::Continue(()))
            .await
    }

    /// Runs `count` invocations of `pattern`, reporting after each one.
    ///
    /// Returning `ControlFlow::Break` from the callback stops the batch
    /// before the next call; the runs captured so far are returned.
    #[tracing::instrument(skip(self, on_progress), fields(%pattern))]
    pub async fn run_with_progress<F>(
        &self,
        pattern: Pattern,
        count: usize,
        mut on_progress: F,
    ) -> Result<BatchRun>
    where
        F: FnMut(BatchProgress<'_>) -> ControlFlow<()>,
    {
        if count == 0 {
            return Err(HarnessError::InvalidBatchSize(count));
        }

        let request = self.builder.build();
        let mut batch = BatchRun::new(pattern, count);

        for _ in 0..count {
            let result = self.invoker.invoke(pattern, &request).await;
            let entry = batch.push(result).clone();
            tracing::info!(
                run = entry.run_index,
                of = count,
                success = entry.result.success,
                latency_ms = entry.result.total_latency,
                "batch run captured"
            );

            let progress = BatchProgress {
                batch: &batch,
                latest: &entry,
            };
            if on_progress(progress).is_break() {
                tracing::info!(captured = batch.len(), "batch stopped by caller");
                break;
            }
        }

        metrics::counter!("harness_batches_total", "pattern" => pattern.label()).increment(1);
        Ok(batch)
    }

    /// Runs a Saga batch followed by a 2PC batch of `count_each` runs.
    pub async fn run_paired(&self, count_each: usize) -> Result<PairedBatch> {
        self.run_paired_with_progress(count_each, |_| ControlFlow::Continue(()))
            .await
    }

    /// Paired variant of [`BatchRunner::run_with_progress`].
    ///
    /// Stopping during the Saga batch skips the 2PC batch, which is then
    /// returned empty.
    pub async fn run_paired_with_progress<F>(
        &self,
        count_each: usize,
        mut on_progress: F,
    ) -> Result<PairedBatch>
    where
        F: FnMut(BatchProgress<'_>) -> ControlFlow<()>,
    {
        if count_each == 0 {
            return Err(HarnessError::InvalidBatchSize(count_each));
        }

        let saga = self
            .run_with_progress(Pattern::Saga, count_each, &mut on_progress)
            .await?;
        let tpc = if saga.is_complete() {
            self.run_with_progress(Pattern::TwoPhaseCommit, count_each, &mut on_progress)
                .await?
        } else {
            BatchRun::new(Pattern::TwoPhaseCommit, count_each)
        };

        Ok(PairedBatch { saga, tpc })
    }
}
