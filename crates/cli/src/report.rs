//! Plain-text report rendering.
//!
//! Each view wraps a harness value and renders it through `Display`, so the
//! caller decides where the text goes.

use std::fmt::{self, Display, Formatter};

use common::{Pattern, ProtocolResult};
use gateway::{CategoryStatus, ConfigStatus, ToggleAck};
use harness::{AggregateMetrics, BatchRun, ComparisonReport, FieldMean, PairedBatch, aggregate};

const LABEL_WIDTH: usize = 24;
const COLUMN_WIDTH: usize = 16;

fn ms(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v} ms"))
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn outcome(success: bool) -> &'static str {
    if success { "SUCCESS" } else { "FAILED" }
}

fn mean(field: &FieldMean) -> String {
    match field.defined_mean {
        None => "-".to_string(),
        Some(defined) if (defined - field.mean).abs() < f64::EPSILON => {
            format!("{:.1}", field.mean)
        }
        Some(defined) => format!("{:.1} ({defined:.1}/{})", field.mean, field.defined),
    }
}

fn row(f: &mut Formatter<'_>, label: &str, saga: &str, tpc: &str) -> fmt::Result {
    writeln!(
        f,
        "{label:<LABEL_WIDTH$}{saga:>COLUMN_WIDTH$}{tpc:>COLUMN_WIDTH$}"
    )
}

/// Detail of one protocol result.
pub struct ResultView<'a>(pub &'a ProtocolResult);

impl Display for ResultView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "{} {}", r.pattern, outcome(r.success))?;
        if let Some(message) = &r.message {
            writeln!(f, "  message:        {message}")?;
        }
        if let Some(details) = &r.error_details {
            writeln!(f, "  details:        {details}")?;
        }
        if r.success {
            writeln!(
                f,
                "  order:          #{} {}",
                r.order_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                text(r.order_status.as_deref())
            )?;
            writeln!(
                f,
                "  payment:        {} {}",
                text(r.transaction_id.as_deref()),
                text(r.payment_status.as_deref())
            )?;
            writeln!(
                f,
                "  shipment:       {} {}",
                text(r.tracking_number.as_deref()),
                text(r.shipment_status.as_deref())
            )?;
            if let Some(amount) = r.total_amount {
                writeln!(f, "  total amount:   {amount:.2}")?;
            }
        }
        writeln!(f, "  total latency:  {} ms", r.total_latency)?;
        writeln!(f, "  order latency:  {}", ms(r.order_latency))?;
        writeln!(f, "  payment:        {}", ms(r.payment_latency))?;
        writeln!(f, "  shipping:       {}", ms(r.shipping_latency))?;
        if r.pattern.has_prepare_phase() {
            writeln!(f, "  prepare:        {}", ms(r.prepare_latency))?;
            writeln!(f, "  commit:         {}", ms(r.commit_latency))?;
        }
        if r.abort_latency.is_some() {
            writeln!(f, "  abort:          {}", ms(r.abort_latency))?;
        }
        write!(f, "  recovery:       {}", r.recovery)
    }
}

/// Side-by-side table of a Saga/2PC comparison.
pub struct ComparisonView<'a>(pub &'a ComparisonReport);

impl Display for ComparisonView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let saga = &self.0.saga;
        let tpc = &self.0.tpc;
        row(f, "", Pattern::Saga.label(), Pattern::TwoPhaseCommit.label())?;
        let lines: [(&str, fn(&ProtocolResult) -> String); 10] = [
            ("Outcome", |r| outcome(r.success).to_string()),
            ("Total latency", |r| format!("{} ms", r.total_latency)),
            ("Order latency", |r| ms(r.order_latency)),
            ("Payment latency", |r| ms(r.payment_latency)),
            ("Shipping latency", |r| ms(r.shipping_latency)),
            ("Prepare latency", |r| ms(r.prepare_latency)),
            ("Commit latency", |r| ms(r.commit_latency)),
            ("Abort latency", |r| ms(r.abort_latency)),
            ("Recovery", |r| r.recovery.to_string()),
            ("Order status", |r| text(r.order_status.as_deref()).to_string()),
        ];
        for (label, field) in lines {
            row(f, label, &field(saga), &field(tpc))?;
        }

        for r in [saga, tpc] {
            if !r.success {
                writeln!(f, "{}: {}", r.pattern, text(r.message.as_deref()))?;
            }
        }
        match self.0.faster() {
            Some(pattern) => write!(
                f,
                "{pattern} was faster by {} ms",
                self.0.latency_delta().unsigned_abs()
            ),
            None if self.0.is_tie() => write!(
                f,
                "Saga and 2PC tied at {} ms",
                self.0.saga.total_latency
            ),
            None => write!(f, "No latency verdict: at least one pattern failed"),
        }
    }
}

/// Run log of one batch.
pub struct RunLogView<'a>(pub &'a BatchRun);

impl Display for RunLogView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let batch = self.0;
        writeln!(
            f,
            "{} batch: {}/{} runs{}",
            batch.pattern(),
            batch.len(),
            batch.planned(),
            if batch.is_complete() { "" } else { " (stopped)" }
        )?;
        for entry in batch.entries() {
            let r = &entry.result;
            write!(
                f,
                "  #{:<4}{:<9}{:>8} ms",
                entry.run_index,
                outcome(r.success),
                r.total_latency
            )?;
            match (&r.message, r.success) {
                (Some(message), false) => writeln!(f, "  {message}")?,
                _ => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Aggregate table of a Saga/2PC batch pair.
pub struct MetricsView<'a> {
    pub saga: &'a AggregateMetrics,
    pub tpc: &'a AggregateMetrics,
}

impl Display for MetricsView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (saga, tpc) = (self.saga, self.tpc);
        let lines: [(&str, fn(&AggregateMetrics) -> String); 14] = [
            ("Runs", |m| m.runs.to_string()),
            ("Success rate", |m| format!("{}%", m.success_rate)),
            ("Total batch time", |m| format!("{} ms", m.total_batch_time)),
            ("Avg total latency", |m| mean(&m.total_latency)),
            ("Avg order latency", |m| mean(&m.order_latency)),
            ("Avg payment latency", |m| mean(&m.payment_latency)),
            ("Avg shipping latency", |m| mean(&m.shipping_latency)),
            ("Avg prepare latency", |m| mean(&m.prepare_latency)),
            ("Avg commit latency", |m| mean(&m.commit_latency)),
            ("Avg abort latency", |m| mean(&m.abort_latency)),
            ("Avg compensations", |m| format!("{:.2}", m.avg_compensations)),
            ("Rollbacks", |m| m.rollbacks.to_string()),
            ("Min/max latency", |m| match (m.min_total_latency, m.max_total_latency) {
                (Some(min), Some(max)) => format!("{min}/{max} ms"),
                _ => "-".to_string(),
            }),
            ("Throughput", |m| {
                m.throughput()
                    .map_or_else(|| "-".to_string(), |t| format!("{t:.2} runs/s"))
            }),
        ];

        row(f, "", Pattern::Saga.label(), Pattern::TwoPhaseCommit.label())?;
        for (label, field) in lines {
            row(f, label, &field(saga), &field(tpc))?;
        }
        Ok(())
    }
}

/// Run logs followed by the aggregate table.
pub struct BatchView<'a>(pub &'a PairedBatch);

impl Display for BatchView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let saga = aggregate(&self.0.saga);
        let tpc = aggregate(&self.0.tpc);
        writeln!(f, "{}", RunLogView(&self.0.saga))?;
        writeln!(f, "{}", RunLogView(&self.0.tpc))?;
        write!(
            f,
            "{}",
            MetricsView {
                saga: &saga,
                tpc: &tpc
            }
        )
    }
}

/// Fault-injection toggle values.
pub struct ConfigStatusView<'a>(pub &'a ConfigStatus);

impl Display for ConfigStatusView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (name, status) in [("fina", &self.0.fina), ("carrier", &self.0.carrier)] {
            match status {
                CategoryStatus::Unavailable { error } => {
                    writeln!(f, "{name}: unavailable ({error})")?
                }
                CategoryStatus::Toggles(toggles) => {
                    writeln!(f, "{name}:")?;
                    for (key, enabled) in toggles {
                        writeln!(f, "  {key:<28}{}", if *enabled { "on" } else { "off" })?;
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct AckView<'a>(pub &'a ToggleAck);

impl Display for AckView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ack = self.0;
        write!(
            f,
            "{} {}",
            ack.setting,
            if ack.enabled { "enabled" } else { "disabled" }
        )?;
        if let Some(message) = &ack.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}
