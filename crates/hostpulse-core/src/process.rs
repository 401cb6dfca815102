//! Per-process readings and their aggregation by normalized identity.
//!
//! Architecture:
//! 1. The collector yields one `Result<ProcessReading, ProcessReadError>` per
//!    OS process
//! 2. Expected per-process failures (exited mid-scan, access denied) are skipped
//! 3. Readable entries are normalized with [`normalize_identity`]
//! 4. Memory (and CPU share when present) is summed per identity, preserving
//!    first-encounter order
//! 5. Per-process records are kept for the top-N ranking mode

use std::collections::HashMap;
use std::path::PathBuf;

use log::trace;
use serde::Serialize;

use crate::identity::normalize_identity;
use crate::units::{bytes_to_gb_raw, round_gb, round_percent};

/// One raw process as reported by the OS collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReading {
    pub pid: u32,
    /// Raw process name; may be empty.
    pub name: String,
    /// Executable path, when readable.
    pub exe: Option<PathBuf>,
    /// Resident set size in bytes.
    pub resident_bytes: u64,
    /// CPU share percent, when the collector measured it.
    pub cpu_percent: Option<f64>,
}

impl ProcessReading {
    pub fn new(pid: u32, name: impl Into<String>, resident_bytes: u64) -> Self {
        Self {
            pid,
            name: name.into(),
            exe: None,
            resident_bytes,
            cpu_percent: None,
        }
    }

    pub fn with_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.exe = Some(exe.into());
        self
    }

    pub fn with_cpu(mut self, cpu_percent: f64) -> Self {
        self.cpu_percent = Some(cpu_percent);
        self
    }

    /// Normalized identity of this reading.
    pub fn identity(&self) -> String {
        normalize_identity(&self.name, self.exe.as_deref())
    }
}

/// Expected per-process failure while scanning the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProcessReadError {
    /// The process exited between enumeration and the metadata read.
    #[error("process {0} vanished during scan")]
    Gone(u32),
    /// The process metadata is not readable with the current privileges.
    #[error("access denied reading process {0}")]
    AccessDenied(u32),
}

/// Memory (and CPU share) summed across every process sharing an identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedConsumer {
    pub name: String,
    pub memory_gb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
}

impl AggregatedConsumer {
    /// Placeholder surfaced when no process could be read.
    pub fn unknown() -> Self {
        Self {
            name: crate::identity::UNKNOWN_IDENTITY.to_string(),
            memory_gb: 0.0,
            cpu_percent: None,
        }
    }

    /// Copy with display rounding applied.
    pub fn rounded(&self) -> Self {
        Self {
            name: self.name.clone(),
            memory_gb: round_gb(self.memory_gb),
            cpu_percent: self.cpu_percent.map(round_percent),
        }
    }
}

/// One readable process kept for the ranking mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub memory_gb: f64,
    pub cpu_percent: f64,
}

/// Result of aggregating one process-table scan.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    consumers: Vec<AggregatedConsumer>,
    index: HashMap<String, usize>,
    records: Vec<ProcessRecord>,
    skipped: usize,
}

impl Aggregation {
    /// Aggregate a scan. Expected per-process failures are counted and skipped.
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Result<ProcessReading, ProcessReadError>>,
    {
        let mut agg = Self::default();
        for reading in readings {
            match reading {
                Ok(reading) => agg.add(&reading),
                Err(err) => {
                    trace!("[process] skipping entry: {err}");
                    agg.skipped += 1;
                }
            }
        }
        agg
    }

    /// Fold one readable process into the running sums.
    pub fn add(&mut self, reading: &ProcessReading) {
        let name = reading.identity();
        let memory_gb = bytes_to_gb_raw(reading.resident_bytes);

        self.records.push(ProcessRecord {
            pid: reading.pid,
            name: name.clone(),
            memory_gb,
            cpu_percent: reading.cpu_percent.unwrap_or(0.0),
        });

        match self.index.get(&name) {
            Some(&i) => {
                let consumer = &mut self.consumers[i];
                consumer.memory_gb += memory_gb;
                if let Some(cpu) = reading.cpu_percent {
                    *consumer.cpu_percent.get_or_insert(0.0) += cpu;
                }
            }
            None => {
                self.index.insert(name.clone(), self.consumers.len());
                self.consumers.push(AggregatedConsumer {
                    name,
                    memory_gb,
                    cpu_percent: reading.cpu_percent,
                });
            }
        }
    }

    /// Consumers in first-encounter order.
    pub fn consumers(&self) -> &[AggregatedConsumer] {
        &self.consumers
    }

    /// Per-process records in scan order.
    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Look up one identity.
    pub fn get(&self, name: &str) -> Option<&AggregatedConsumer> {
        self.index.get(name).map(|&i| &self.consumers[i])
    }

    /// Number of distinct identities.
    pub fn identity_count(&self) -> usize {
        self.consumers.len()
    }

    /// Number of entries skipped because they could not be read.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Sum of memory across all identities, unrounded.
    pub fn total_memory_gb(&self) -> f64 {
        self.consumers.iter().map(|c| c.memory_gb).sum()
    }
}
