//! Memory growth between consecutive snapshots.
//!
//! This module walks a parsed Massif run and reports where memory grew
//! the most, in an agent-friendly NDJSON form:
//! - a header record describing the run
//! - one record per growth step, largest total growth first

use crate::Result;
use crate::datasize::DataSize;
use massif_parse::{Massif, Snapshot};
use serde::Serialize;
use std::io::Write;

/// Size change between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrowthStep {
    pub from_index: i64,
    pub to_index: i64,
    pub from_time: String,
    pub to_time: String,
    pub heap_delta: i64,
    pub heap_extra_delta: i64,
    pub stack_delta: i64,
    pub total_delta: i64,
}

impl GrowthStep {
    fn between(from: &Snapshot, to: &Snapshot) -> Self {
        GrowthStep {
            from_index: from.index,
            to_index: to.index,
            from_time: from.time.clone(),
            to_time: to.time.clone(),
            heap_delta: to.memory_heap.saturating_sub(from.memory_heap),
            heap_extra_delta: to.memory_heap_extra.saturating_sub(from.memory_heap_extra),
            stack_delta: to.memory_stack.saturating_sub(from.memory_stack),
            total_delta: to.total_bytes().saturating_sub(from.total_bytes()),
        }
    }
}

/// Growth analysis result.
pub struct Growth {
    pub source: String,
    pub time_unit: Option<String>,
    pub snapshot_count: usize,
    /// Largest steps first; steps of equal size stay in file order.
    pub steps: Vec<GrowthStep>,
    /// Total bytes of the last snapshot minus those of the first.
    pub net_total_delta: i64,
}

impl Growth {
    /// Compute the `top` largest growth steps of a run.
    pub fn compute(massif: &Massif, source: &str, top: usize) -> Self {
        let mut steps: Vec<GrowthStep> = massif
            .snapshots
            .windows(2)
            .map(|pair| GrowthStep::between(&pair[0], &pair[1]))
            .collect();

        // Sort by total delta descending
        steps.sort_by(|a, b| b.total_delta.cmp(&a.total_delta));
        steps.truncate(top);

        let net_total_delta = match (massif.snapshots.first(), massif.snapshots.last()) {
            (Some(first), Some(last)) => last.total_bytes().saturating_sub(first.total_bytes()),
            _ => 0,
        };

        Growth {
            source: source.to_string(),
            time_unit: massif.time_unit.clone(),
            snapshot_count: massif.snapshots.len(),
            steps,
            net_total_delta,
        }
    }

    /// Write growth as NDJSON.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<()> {
        // Write header
        let header = serde_json::json!({
            "type": "header",
            "format": "massif-growth",
            "version": "0.1",
            "source": self.source,
            "time_unit": self.time_unit,
            "snapshot_count": self.snapshot_count,
            "net_total_delta": self.net_total_delta,
            "net_total_delta_human": DataSize::from_bytes(self.net_total_delta).to_string()
        });
        writeln!(writer, "{}", serde_json::to_string(&header)?)?;

        for step in &self.steps {
            let record = serde_json::json!({
                "type": "growth",
                "from_index": step.from_index,
                "to_index": step.to_index,
                "from_time": step.from_time,
                "to_time": step.to_time,
                "heap_delta": step.heap_delta,
                "heap_extra_delta": step.heap_extra_delta,
                "stack_delta": step.stack_delta,
                "total_delta": step.total_delta,
                "total_delta_human": DataSize::from_bytes(step.total_delta).to_string()
            });
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        }

        Ok(())
    }
}
