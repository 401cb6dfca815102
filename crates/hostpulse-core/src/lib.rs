//! # hostpulse-core
//!
//! **Live host pressure with a verdict and a one-glance insight.**
//!
//! `hostpulse-core` samples CPU, memory and swap counters, folds the process
//! table into per-application memory totals, classifies the host into an
//! ordered verdict, and phrases a short insight about it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use hostpulse_core::{Config, StatusService, SysinfoCollector};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let service = Arc::new(StatusService::from_config(
//!     &config,
//!     Arc::new(SysinfoCollector::new()),
//! )?);
//!
//! let report = service.report().await?;
//! println!("{}: {}", report.verdict, report.ai_insight);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Collector → Aggregator → Selector → Classifier → Composer → Report
//!
//! Two verdict policies:
//! - **memory** (default): memory percent alone decides; CPU is reported only.
//! - **memory-swap**: memory or swap pressure can escalate the verdict.
//!
//! Two prompt styles for the text generator:
//! - **numbered** (default): three numbered lines naming the top process.
//! - **brief**: one short line under a verdict-dependent character limit.
//!
//! Every collaborator sits behind a trait. [`MetricsCollector`] reads the
//! host and [`TextGenerator`] phrases insights. A report is always produced:
//! unreadable processes are skipped, an empty scan surfaces an `unknown`
//! consumer, and generator failures fall back to a local template.

pub mod collector;
pub mod config;
pub mod generator;
pub mod identity;
pub mod insight;
pub mod process;
pub mod report;
pub mod selector;
pub mod snapshot;
pub mod units;
pub mod verdict;

pub use collector::{
    CollectorError, HostReadings, MetricsCollector, SwapMemory, SysinfoCollector, VirtualMemory,
};
pub use config::{
    ClassifierConfig, Config, ConfigError, GeneratorConfig, InsightConfig, SamplingConfig,
    ServerConfig,
};
pub use generator::{DEFAULT_GEMINI_ENDPOINT, GeminiClient, GenerateError, TextGenerator};
pub use identity::{FRIENDLY_NAMES, UNKNOWN_IDENTITY, normalize_identity};
pub use insight::{
    Insight, InsightComposer, InsightSource, PromptStyle, STABLE_MESSAGE, build_prompt,
    fallback_text,
};
pub use process::{AggregatedConsumer, Aggregation, ProcessReadError, ProcessReading, ProcessRecord};
pub use report::{InsightReport, MemoryBreakdown, Sample, ServiceError, StatusService, TopProcess};
pub use selector::{DEFAULT_TOP_N, MAX_TOP_N, TopProcesses, top_consumer, top_n};
pub use snapshot::{MemoryBlock, SwapBlock, SystemSnapshot};
pub use units::{bytes_to_gb, bytes_to_gb_raw};
pub use verdict::{Verdict, VerdictPolicy};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
