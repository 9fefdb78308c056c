//! JSON export of parsed Massif documents.
//!
//! The full document is written as a single JSON value. [`Summary`] is a
//! smaller view of the run for dashboards that only need the totals and
//! the peak.

use crate::Result;
use crate::datasize::DataSize;
use massif_parse::Massif;
use serde::Serialize;
use std::io::Write;

/// The snapshot with the largest useful heap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakUsage {
    pub index: i64,
    pub time: String,
    pub heap: DataSize,
    pub heap_human: String,
}

/// Overview of one profiled run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    pub snapshot_count: usize,
    pub detailed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<PeakUsage>,
}

impl Summary {
    pub fn compute(massif: &Massif) -> Self {
        let peak = massif.peak_snapshot().map(|snapshot| {
            let heap = DataSize::from_bytes(snapshot.memory_heap);
            PeakUsage {
                index: snapshot.index,
                time: snapshot.time.clone(),
                heap,
                heap_human: heap.to_string(),
            }
        });

        Summary {
            command: massif.command_line(),
            time_unit: massif.time_unit.clone(),
            snapshot_count: massif.snapshots.len(),
            detailed_count: massif.detailed_snapshots().count(),
            peak,
        }
    }

    /// One-line description of the peak, e.g.
    /// `Max memory usage of 21.04 MiB in snapshot 3 at time 273947848i`.
    pub fn peak_message(&self) -> Option<String> {
        let peak = self.peak.as_ref()?;
        Some(format!(
            "Max memory usage of {} in snapshot {} at time {}{}",
            peak.heap_human,
            peak.index,
            peak.time,
            self.time_unit.as_deref().unwrap_or("")
        ))
    }
}

/// Write the whole document as one JSON value followed by a newline.
pub fn write_json<W: Write>(massif: &Massif, writer: W, pretty: bool) -> Result<()> {
    write_value(massif, writer, pretty)
}

/// Write a summary as one JSON value followed by a newline.
pub fn write_summary<W: Write>(summary: &Summary, writer: W, pretty: bool) -> Result<()> {
    write_value(summary, writer, pretty)
}

fn write_value<T: Serialize, W: Write>(value: &T, mut writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}
