//! Benchmark session driving the harness state machine.

use std::ops::ControlFlow;
use std::sync::Arc;

use common::{Pattern, ProtocolResult, SessionId};
use gateway::{ConfigStatus, FaultToggle, GatewayClient, ToggleAck};
use tokio::sync::watch;

use crate::aggregate::aggregate;
use crate::batch::{BatchProgress, BatchRunner, PairedBatch};
use crate::compare::{ComparisonEngine, ComparisonReport};
use crate::error::{HarnessError, Result};
use crate::invoker::ProtocolInvoker;
use crate::request::RequestBuilder;
use crate::state::{HarnessSnapshot, HarnessStatus, RunLogEntry, RunMode};

/// Runs single, comparison and batch benchmarks against one gateway.
///
/// After every transition and every captured run a fresh
/// [`HarnessSnapshot`] replaces the previous one; observers obtain it
/// through [`Harness::subscribe`]. Run methods take `&mut self`, so a new
/// run cannot start while another is in progress.
pub struct Harness<G> {
    invoker: ProtocolInvoker<G>,
    builder: RequestBuilder,
    session_id: SessionId,
    updates: watch::Sender<Arc<HarnessSnapshot>>,
}

impl<G: GatewayClient> Harness<G> {
    /// Creates an idle harness.
    pub fn new(client: G, builder: RequestBuilder) -> Self {
        let session_id = SessionId::new();
        let (updates, _) = watch::channel(Arc::new(HarnessSnapshot::new(session_id)));
        tracing::debug!(%session_id, "harness session created");
        Self {
            invoker: ProtocolInvoker::new(client),
            builder,
            session_id,
            updates,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn client(&self) -> &G {
        self.invoker.client()
    }

    /// Returns a receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<HarnessSnapshot>> {
        self.updates.subscribe()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<HarnessSnapshot> {
        self.updates.borrow().clone()
    }

    /// Applies `update` to the current snapshot and notifies subscribers.
    ///
    /// The snapshot is copied only if a caller still holds the previous one.
    fn publish(&self, update: impl FnOnce(&mut HarnessSnapshot)) {
        self.updates
            .send_modify(|snapshot| update(Arc::make_mut(snapshot)));
    }

    fn begin(&self, mode: RunMode) {
        tracing::info!(session_id = %self.session_id, %mode, "run started");
        self.publish(|s| {
            s.status = HarnessStatus::Running(mode);
            if mode == RunMode::Batch {
                s.saga_batch = None;
                s.tpc_batch = None;
                s.saga_metrics = None;
                s.tpc_metrics = None;
            }
        });
    }

    fn fail(&self, mode: RunMode, err: &HarnessError) {
        tracing::error!(session_id = %self.session_id, %mode, error = %err, "run failed");
        self.publish(|s| {
            s.status = HarnessStatus::Failed {
                mode,
                reason: err.to_string(),
            };
        });
    }

    /// Places one order with `pattern`.
    pub async fn run_single(&mut self, pattern: Pattern) -> ProtocolResult {
        let mode = RunMode::Single(pattern);
        self.begin(mode);

        let request = self.builder.build();
        let result = self.invoker.invoke(pattern, &request).await;

        self.publish(|s| {
            s.latest = Some(result.clone());
            s.run_log.push(RunLogEntry::new(mode, None, &result));
            s.status = HarnessStatus::Completed(mode);
        });
        result
    }

    /// Places one order per pattern and pairs the results.
    pub async fn run_compare(&mut self) -> ComparisonReport {
        let mode = RunMode::Compare;
        self.begin(mode);

        let report = ComparisonEngine::new(&self.invoker, &self.builder)
            .compare()
            .await;

        self.publish(|s| {
            s.latest = Some(report.tpc.clone());
            s.comparison = Some(report.clone());
            for result in [&report.saga, &report.tpc] {
                s.run_log.push(RunLogEntry::new(mode, None, result));
            }
            s.status = HarnessStatus::Completed(mode);
        });
        report
    }

    /// Runs a Saga batch and a 2PC batch of `count_each` runs.
    pub async fn run_batch(&mut self, count_each: usize) -> Result<PairedBatch> {
        self.run_batch_with_progress(count_each, |_| ControlFlow::Continue(()))
            .await
    }

    /// Like [`Harness::run_batch`], with a callback invoked after each run.
    ///
    /// The snapshot already reflects the run when the callback is called.
    /// Returning `ControlFlow::Break` stops the batch between runs.
    pub async fn run_batch_with_progress<F>(
        &mut self,
        count_each: usize,
        mut on_progress: F,
    ) -> Result<PairedBatch>
    where
        F: FnMut(BatchProgress<'_>) -> ControlFlow<()>,
    {
        let mode = RunMode::Batch;
        self.begin(mode);

        if count_each == 0 {
            let err = HarnessError::InvalidBatchSize(count_each);
            self.fail(mode, &err);
            return Err(err);
        }

        let runner = BatchRunner::new(&self.invoker, &self.builder);
        let outcome = runner
            .run_paired_with_progress(count_each, |progress| {
                let metrics = aggregate(progress.batch);
                let latest = progress.latest;
                self.publish(|s| {
                    s.latest = Some(latest.result.clone());
                    s.run_log.push(RunLogEntry::new(
                        mode,
                        Some(latest.run_index),
                        &latest.result,
                    ));
                    let (batch, slot) = match progress.pattern() {
                        Pattern::Saga => (&mut s.saga_batch, &mut s.saga_metrics),
                        Pattern::TwoPhaseCommit => (&mut s.tpc_batch, &mut s.tpc_metrics),
                    };
                    batch
                        .get_or_insert_with(|| progress.batch.without_entries())
                        .push(latest.result.clone());
                    *slot = Some(metrics);
                });
                on_progress(progress)
            })
            .await;

        match outcome {
            Ok(paired) => {
                tracing::info!(
                    saga_runs = paired.saga.len(),
                    tpc_runs = paired.tpc.len(),
                    "batch completed"
                );
                self.publish(|s| s.status = HarnessStatus::Completed(mode));
                Ok(paired)
            }
            Err(err) => {
                self.fail(mode, &err);
                Err(err)
            }
        }
    }

    /// Reads the gateway's fault-injection toggles.
    pub async fn fault_status(&self) -> Result<ConfigStatus> {
        Ok(self.client().config_status().await?)
    }

    /// Switches a fault-injection toggle.
    pub async fn set_fault(&self, toggle: FaultToggle, enabled: bool) -> Result<ToggleAck> {
        Ok(self.client().set_toggle(toggle, enabled).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{FaultCategory, FaultSetting, InMemoryGateway, Scripted};

    fn harness(gateway: InMemoryGateway) -> Harness<InMemoryGateway> {
        Harness::new(gateway, RequestBuilder::default())
    }

    #[tokio::test]
    async fn test_new_harness_is_idle() {
        let h = harness(InMemoryGateway::new());
        let snapshot = h.snapshot();
        assert_eq!(snapshot.status, HarnessStatus::Idle);
        assert_eq!(snapshot.session_id, h.session_id());
    }

    #[tokio::test]
    async fn test_run_single_completes_and_logs() {
        let mut h = harness(InMemoryGateway::new());
        let rx = h.subscribe();

        let result = h.run_single(Pattern::TwoPhaseCommit).await;

        let snapshot = rx.borrow().clone();
        assert_eq!(
            snapshot.status,
            HarnessStatus::Completed(RunMode::Single(Pattern::TwoPhaseCommit))
        );
        assert_eq!(snapshot.latest.as_ref(), Some(&result));
        assert_eq!(snapshot.run_log.len(), 1);
        assert_eq!(snapshot.run_log[0].run_index, None);
    }

    #[tokio::test]
    async fn test_remote_failure_still_completes() {
        let gateway = InMemoryGateway::new();
        gateway.script(Pattern::Saga, Scripted::unreachable("connection refused"));
        let mut h = harness(gateway);

        let result = h.run_single(Pattern::Saga).await;

        assert!(!result.success);
        assert_eq!(
            h.snapshot().status,
            HarnessStatus::Completed(RunMode::Single(Pattern::Saga))
        );
    }

    #[tokio::test]
    async fn test_run_compare_publishes_pair() {
        let mut h = harness(InMemoryGateway::new());

        let report = h.run_compare().await;

        let snapshot = h.snapshot();
        assert_eq!(snapshot.comparison.as_ref(), Some(&report));
        assert_eq!(snapshot.status, HarnessStatus::Completed(RunMode::Compare));
        let patterns: Vec<Pattern> = snapshot.run_log.iter().map(|e| e.pattern).collect();
        assert_eq!(patterns, vec![Pattern::Saga, Pattern::TwoPhaseCommit]);
    }

    #[tokio::test]
    async fn test_zero_batch_fails_without_partial_state() {
        let gateway = InMemoryGateway::new();
        let mut h = harness(gateway.clone());
        h.run_batch(2).await.unwrap();

        let err = h.run_batch(0).await.unwrap_err();

        assert!(matches!(err, HarnessError::InvalidBatchSize(0)));
        let snapshot = h.snapshot();
        assert!(matches!(
            snapshot.status,
            HarnessStatus::Failed {
                mode: RunMode::Batch,
                ..
            }
        ));
        assert!(snapshot.saga_batch.is_none());
        assert!(snapshot.tpc_metrics.is_none());
        assert_eq!(gateway.call_count(Pattern::Saga), 2);
    }

    #[tokio::test]
    async fn test_batch_snapshot_is_updated_after_every_run() {
        let mut h = harness(InMemoryGateway::new());
        let rx = h.subscribe();

        let mut observed = Vec::new();
        let paired = h
            .run_batch_with_progress(3, |progress| {
                let snapshot = rx.borrow().clone();
                let captured = snapshot
                    .batch(progress.pattern())
                    .map(|batch| batch.len())
                    .unwrap_or(0);
                observed.push((progress.pattern(), captured));
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        assert_eq!(
            observed,
            vec![
                (Pattern::Saga, 1),
                (Pattern::Saga, 2),
                (Pattern::Saga, 3),
                (Pattern::TwoPhaseCommit, 1),
                (Pattern::TwoPhaseCommit, 2),
                (Pattern::TwoPhaseCommit, 3),
            ]
        );

        let snapshot = h.snapshot();
        assert_eq!(snapshot.status, HarnessStatus::Completed(RunMode::Batch));
        assert_eq!(snapshot.saga_batch.as_ref(), Some(&paired.saga));
        assert_eq!(snapshot.tpc_metrics.as_ref().map(|m| m.runs), Some(3));
        assert_eq!(snapshot.run_log.len(), 6);
    }

    #[tokio::test]
    async fn test_published_snapshots_are_not_mutated() {
        let mut h = harness(InMemoryGateway::new());
        h.run_single(Pattern::Saga).await;
        let before = h.snapshot();

        h.run_single(Pattern::TwoPhaseCommit).await;

        assert_eq!(before.run_log.len(), 1);
        assert_eq!(h.snapshot().run_log.len(), 2);
    }

    #[tokio::test]
    async fn test_fault_toggles_pass_through() {
        let gateway = InMemoryGateway::new();
        let h = harness(gateway.clone());
        let toggle = FaultToggle::new(FaultCategory::Fina, FaultSetting::Availability).unwrap();

        let ack = h.set_fault(toggle, false).await.unwrap();
        assert!(!ack.enabled);

        let status = h.fault_status().await.unwrap();
        assert_eq!(status.is_enabled(toggle), Some(false));
        assert!(!gateway.is_enabled(toggle));
    }

    #[tokio::test]
    async fn test_snapshot_held_during_batch_keeps_its_contents() {
        let mut h = harness(InMemoryGateway::new());
        let rx = h.subscribe();

        let mut held = Vec::new();
        let paired = h
            .run_batch_with_progress(3, |_| {
                held.push(rx.borrow().clone());
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        let saga_lens: Vec<usize> = held
            .iter()
            .take(3)
            .map(|s| s.saga_batch.as_ref().map_or(0, |b| b.len()))
            .collect();
        assert_eq!(saga_lens, vec![1, 2, 3]);
        let log_lens: Vec<usize> = held.iter().map(|s| s.run_log.len()).collect();
        assert_eq!(log_lens, vec![1, 2, 3, 4, 5, 6]);

        let snapshot = h.snapshot();
        assert_eq!(snapshot.saga_batch.as_ref(), Some(&paired.saga));
        assert_eq!(snapshot.tpc_batch.as_ref(), Some(&paired.tpc));
    }
}
