//! Verdict classification.
//!
//! Two policies coexist. [`VerdictPolicy::Memory`] looks at memory pressure
//! only; CPU is reported next to the verdict but never changes it.
//! [`VerdictPolicy::MemorySwap`] also escalates on swap usage. All boundaries
//! are strict inequalities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::snapshot::SystemSnapshot;

/// Severity of current resource pressure, ordered `Normal < Strained < Overloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Normal,
    Strained,
    Overloaded,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Strained => "STRAINED",
            Self::Overloaded => "OVERLOADED",
        }
    }

    /// Whether the insight composer can skip the text generator.
    pub fn is_stable(&self) -> bool {
        *self == Self::Normal
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory percent below which [`VerdictPolicy::Memory`] reports NORMAL.
pub const MEMORY_STRAINED_AT: f64 = 70.0;
/// Memory percent below which [`VerdictPolicy::Memory`] reports STRAINED.
pub const MEMORY_OVERLOADED_AT: f64 = 85.0;
/// Swap percent above which [`VerdictPolicy::MemorySwap`] reports STRAINED.
pub const SWAP_STRAINED_ABOVE: f64 = 20.0;
/// Swap percent above which [`VerdictPolicy::MemorySwap`] reports OVERLOADED.
pub const SWAP_OVERLOADED_ABOVE: f64 = 50.0;

/// Which readings drive the verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictPolicy {
    /// `mem < 70` NORMAL, `mem < 85` STRAINED, else OVERLOADED.
    #[default]
    Memory,
    /// `mem > 85 || swap > 50` OVERLOADED, `mem > 70 || swap > 20` STRAINED,
    /// else NORMAL.
    MemorySwap,
}

impl VerdictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::MemorySwap => "memory-swap",
        }
    }

    /// Classify raw percents. `cpu_percent` is accepted by both policies and
    /// used by neither.
    pub fn classify_percents(
        &self,
        _cpu_percent: f64,
        memory_percent: f64,
        swap_percent: f64,
    ) -> Verdict {
        match self {
            Self::Memory => {
                if memory_percent < MEMORY_STRAINED_AT {
                    Verdict::Normal
                } else if memory_percent < MEMORY_OVERLOADED_AT {
                    Verdict::Strained
                } else {
                    Verdict::Overloaded
                }
            }
            Self::MemorySwap => {
                if memory_percent > MEMORY_OVERLOADED_AT || swap_percent > SWAP_OVERLOADED_ABOVE {
                    Verdict::Overloaded
                } else if memory_percent > MEMORY_STRAINED_AT || swap_percent > SWAP_STRAINED_ABOVE
                {
                    Verdict::Strained
                } else {
                    Verdict::Normal
                }
            }
        }
    }

    /// Classify a snapshot.
    pub fn classify(&self, snapshot: &SystemSnapshot) -> Verdict {
        self.classify_percents(
            snapshot.cpu_percent,
            snapshot.memory.percent,
            snapshot.swap.percent,
        )
    }
}

impl fmt::Display for VerdictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verdict policy '{0}' (expected memory or memory-swap)")]
pub struct ParsePolicyError(pub String);

impl FromStr for VerdictPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "cpu-memory" | "a" => Ok(Self::Memory),
            "memory-swap" | "memory_swap" | "swap" | "b" => Ok(Self::MemorySwap),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
