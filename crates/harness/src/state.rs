//! Harness state machine and published snapshot.

use chrono::{DateTime, Utc};
use common::{Pattern, ProtocolResult, SessionId};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateMetrics;
use crate::batch::BatchRun;
use crate::compare::ComparisonReport;

/// What the harness was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    Single(Pattern),
    Compare,
    Batch,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Single(pattern) => write!(f, "Single({pattern})"),
            RunMode::Compare => write!(f, "Compare"),
            RunMode::Batch => write!(f, "Batch"),
        }
    }
}

/// Lifecycle of a harness run.
///
/// State transitions:
/// ```text
/// Idle ──► Running(mode) ──┬──► Completed(mode)
///                          └──► Failed { mode, reason }
/// ```
/// `Failed` is reached only through local errors. A finished run can be
/// followed by another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HarnessStatus {
    #[default]
    Idle,
    Running(RunMode),
    Completed(RunMode),
    Failed { mode: RunMode, reason: String },
}

impl HarnessStatus {
    /// Returns true if a new run may start.
    pub fn can_start(&self) -> bool {
        !matches!(self, HarnessStatus::Running(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(self, HarnessStatus::Running(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HarnessStatus::Idle => "Idle",
            HarnessStatus::Running(_) => "Running",
            HarnessStatus::Completed(_) => "Completed",
            HarnessStatus::Failed { .. } => "Failed",
        }
    }
}

impl std::fmt::Display for HarnessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessStatus::Idle => write!(f, "Idle"),
            HarnessStatus::Running(mode) => write!(f, "Running({mode})"),
            HarnessStatus::Completed(mode) => write!(f, "Completed({mode})"),
            HarnessStatus::Failed { mode, reason } => write!(f, "Failed({mode}): {reason}"),
        }
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogEntry {
    pub mode: RunMode,
    pub pattern: Pattern,
    /// Position within the batch, for batch runs.
    pub run_index: Option<usize>,
    pub success: bool,
    pub total_latency: u64,
    pub message: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl RunLogEntry {
    pub fn new(mode: RunMode, run_index: Option<usize>, result: &ProtocolResult) -> Self {
        Self {
            mode,
            pattern: result.pattern,
            run_index,
            success: result.success,
            total_latency: result.total_latency,
            message: result.message.clone(),
            captured_at: Utc::now(),
        }
    }
}

/// Everything an observer may render, captured at one instant.
///
/// Snapshots are never modified after publication; each update produces a
/// new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessSnapshot {
    pub session_id: SessionId,
    pub status: HarnessStatus,
    pub latest: Option<ProtocolResult>,
    pub comparison: Option<ComparisonReport>,
    pub saga_batch: Option<BatchRun>,
    pub tpc_batch: Option<BatchRun>,
    pub saga_metrics: Option<AggregateMetrics>,
    pub tpc_metrics: Option<AggregateMetrics>,
    pub run_log: Vec<RunLogEntry>,
}

impl HarnessSnapshot {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            status: HarnessStatus::Idle,
            latest: None,
            comparison: None,
            saga_batch: None,
            tpc_batch: None,
            saga_metrics: None,
            tpc_metrics: None,
            run_log: Vec::new(),
        }
    }

    pub fn batch(&self, pattern: Pattern) -> Option<&BatchRun> {
        match pattern {
            Pattern::Saga => self.saga_batch.as_ref(),
            Pattern::TwoPhaseCommit => self.tpc_batch.as_ref(),
        }
    }

    pub fn metrics(&self, pattern: Pattern) -> Option<&AggregateMetrics> {
        match pattern {
            Pattern::Saga => self.saga_metrics.as_ref(),
            Pattern::TwoPhaseCommit => self.tpc_metrics.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_idle() {
        assert_eq!(HarnessStatus::default(), HarnessStatus::Idle);
        assert!(HarnessStatus::Idle.can_start());
    }

    #[test]
    fn test_running_blocks_start() {
        assert!(!HarnessStatus::Running(RunMode::Batch).can_start());
        assert!(HarnessStatus::Completed(RunMode::Batch).can_start());
        assert!(
            HarnessStatus::Failed {
                mode: RunMode::Batch,
                reason: "bad size".to_string()
            }
            .can_start()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(HarnessStatus::Idle.to_string(), "Idle");
        assert_eq!(
            HarnessStatus::Running(RunMode::Single(Pattern::TwoPhaseCommit)).to_string(),
            "Running(Single(2PC))"
        );
        assert_eq!(
            HarnessStatus::Completed(RunMode::Compare).to_string(),
            "Completed(Compare)"
        );
        let failed = HarnessStatus::Failed {
            mode: RunMode::Batch,
            reason: "x".to_string(),
        };
        assert_eq!(failed.as_str(), "Failed");
        assert_eq!(failed.to_string(), "Failed(Batch): x");
    }

    #[test]
    fn test_new_snapshot_is_empty() {
        let snapshot = HarnessSnapshot::new(SessionId::new());
        assert_eq!(snapshot.status, HarnessStatus::Idle);
        assert!(snapshot.run_log.is_empty());
        assert!(snapshot.batch(Pattern::Saga).is_none());
        assert!(snapshot.metrics(Pattern::TwoPhaseCommit).is_none());
    }

    #[test]
    fn test_log_entry_copies_result_fields() {
        let result = ProtocolResult::transport_failure(Pattern::Saga, "Error: refused");
        let entry = RunLogEntry::new(RunMode::Batch, Some(3), &result);
        assert_eq!(entry.pattern, Pattern::Saga);
        assert_eq!(entry.run_index, Some(3));
        assert!(!entry.success);
        assert_eq!(entry.message.as_deref(), Some("Error: refused"));
    }
}
