//! Point-in-time CPU, memory and swap readings for one request.

use serde::{Deserialize, Serialize};

use crate::collector::{SwapMemory, VirtualMemory};
use crate::units::{bytes_to_gb, round_percent};

/// Physical memory block, in binary gigabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

/// Swap block, in binary gigabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapBlock {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

/// Host readings sampled once per request. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f64,
    pub memory: MemoryBlock,
    pub swap: SwapBlock,
}

impl SystemSnapshot {
    /// Build a snapshot from raw collector readings.
    ///
    /// Percents are rounded to one decimal before anything is classified, so
    /// the verdict always agrees with the displayed value.
    pub fn from_readings(cpu_percent: f64, memory: &VirtualMemory, swap: &SwapMemory) -> Self {
        Self {
            cpu_percent: round_percent(cpu_percent.clamp(0.0, 100.0)),
            memory: MemoryBlock {
                total_gb: bytes_to_gb(memory.total),
                used_gb: bytes_to_gb(memory.used),
                free_gb: bytes_to_gb(memory.free),
                available_gb: bytes_to_gb(memory.available),
                percent: round_percent(memory.percent),
            },
            swap: SwapBlock {
                total_gb: bytes_to_gb(swap.total),
                used_gb: bytes_to_gb(swap.used),
                percent: round_percent(swap.percent),
            },
        }
    }

    /// Snapshot with the given percents and zeroed capacities. Handy for
    /// classifying hypothetical readings.
    pub fn with_percents(cpu_percent: f64, memory_percent: f64, swap_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory: MemoryBlock {
                total_gb: 0.0,
                used_gb: 0.0,
                free_gb: 0.0,
                available_gb: 0.0,
                percent: memory_percent,
            },
            swap: SwapBlock {
                total_gb: 0.0,
                used_gb: 0.0,
                percent: swap_percent,
            },
        }
    }
}
