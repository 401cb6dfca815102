//! Top-consumer selection over an [`Aggregation`].

use serde::Serialize;

use crate::process::{AggregatedConsumer, Aggregation, ProcessRecord};
use crate::units::{round_gb, round_percent};

/// Default number of entries returned by [`top_n`].
pub const DEFAULT_TOP_N: usize = 3;

/// Largest number of entries [`top_n`] returns per list.
pub const MAX_TOP_N: usize = 50;

/// The identity with the most memory, rounded for display.
///
/// Ties keep the first-encountered identity. An empty aggregation yields
/// [`AggregatedConsumer::unknown`].
pub fn top_consumer(aggregation: &Aggregation) -> AggregatedConsumer {
    let mut best: Option<&AggregatedConsumer> = None;
    for consumer in aggregation.consumers() {
        match best {
            Some(b) if consumer.memory_gb <= b.memory_gb => {}
            _ => best = Some(consumer),
        }
    }
    best.map(AggregatedConsumer::rounded)
        .unwrap_or_else(AggregatedConsumer::unknown)
}

/// Processes ranked separately by memory and by CPU share.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopProcesses {
    pub top_memory: Vec<ProcessRecord>,
    pub top_cpu: Vec<ProcessRecord>,
}

/// Rank the per-process records of `aggregation`, `n` entries per list.
///
/// Sorting is stable, so equal values keep scan order. `n` is clamped to
/// `1..=MAX_TOP_N`.
pub fn top_n(aggregation: &Aggregation, n: usize) -> TopProcesses {
    let n = n.clamp(1, MAX_TOP_N);
    let records = aggregation.records();

    let mut by_memory: Vec<&ProcessRecord> = records.iter().collect();
    by_memory.sort_by(|a, b| b.memory_gb.total_cmp(&a.memory_gb));

    let mut by_cpu: Vec<&ProcessRecord> = records.iter().collect();
    by_cpu.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));

    TopProcesses {
        top_memory: by_memory.into_iter().take(n).map(display_record).collect(),
        top_cpu: by_cpu.into_iter().take(n).map(display_record).collect(),
    }
}

fn display_record(record: &ProcessRecord) -> ProcessRecord {
    ProcessRecord {
        pid: record.pid,
        name: record.name.clone(),
        memory_gb: round_gb(record.memory_gb),
        cpu_percent: round_percent(record.cpu_percent),
    }
}
