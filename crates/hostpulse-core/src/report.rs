//! The status pipeline: sample → aggregate → select → classify → compose.
//!
//! [`StatusService`] holds only immutable configuration and shared
//! collaborators. Every call takes a fresh snapshot; nothing is cached between
//! requests.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::collector::{CollectorError, MetricsCollector};
use crate::config::{Config, ConfigError};
use crate::insight::{InsightComposer, InsightSource, PromptStyle};
use crate::process::{AggregatedConsumer, Aggregation};
use crate::selector::{TopProcesses, top_consumer, top_n};
use crate::snapshot::{SwapBlock, SystemSnapshot};
use crate::units::round_percent;
use crate::verdict::{Verdict, VerdictPolicy};

/// Memory breakdown shown in the report, in binary gigabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryBreakdown {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub available_gb: f64,
}

/// The surfaced top consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProcess {
    pub name: String,
    pub memory_gb: f64,
}

impl From<&AggregatedConsumer> for TopProcess {
    fn from(c: &AggregatedConsumer) -> Self {
        Self {
            name: c.name.clone(),
            memory_gb: c.memory_gb,
        }
    }
}

/// Response of `GET /status`. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub memory: MemoryBreakdown,
    pub swap: SwapBlock,
    pub top_process: TopProcess,
    pub verdict: Verdict,
    pub ai_insight: String,
    #[serde(skip)]
    pub insight_source: InsightSource,
}

/// One sampling cycle's readings.
#[derive(Debug, Clone)]
pub struct Sample {
    pub snapshot: SystemSnapshot,
    pub aggregation: Aggregation,
}

/// Failure that prevents any report from being produced.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error("sampling task failed: {0}")]
    Sampling(String),
}

/// Produces reports from a collector, a policy and a composer.
pub struct StatusService {
    collector: Arc<dyn MetricsCollector>,
    composer: InsightComposer,
    policy: VerdictPolicy,
    cpu_window: Duration,
    top_n: usize,
}

impl StatusService {
    pub fn new(
        collector: Arc<dyn MetricsCollector>,
        composer: InsightComposer,
        policy: VerdictPolicy,
        cpu_window: Duration,
        top_n: usize,
    ) -> Self {
        Self {
            collector,
            composer,
            policy,
            cpu_window,
            top_n: top_n.max(1),
        }
    }

    /// Wire a service from configuration.
    pub fn from_config(
        config: &Config,
        collector: Arc<dyn MetricsCollector>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = config.build_generator()?;
        if generator.is_none() {
            info!("[status] no generator API key configured; insights use local templates");
        }
        let composer = InsightComposer::new(
            generator,
            config.insight.style,
            config.insight.timeout(),
        );
        Ok(Self::new(
            collector,
            composer,
            config.classifier.policy,
            config.cpu_window(),
            config.insight.top_n,
        ))
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    pub fn style(&self) -> PromptStyle {
        self.composer.style()
    }

    pub fn top_n_default(&self) -> usize {
        self.top_n
    }

    pub fn collector_name(&self) -> &'static str {
        self.collector.name()
    }

    pub fn has_generator(&self) -> bool {
        self.composer.has_generator()
    }

    /// CPU, memory and swap only. Blocks for the CPU window.
    pub fn snapshot(&self) -> Result<SystemSnapshot, CollectorError> {
        let cpu = self.collector.cpu_percent(self.cpu_window)?;
        let memory = self.collector.virtual_memory()?;
        let swap = self.collector.swap_memory()?;
        Ok(SystemSnapshot::from_readings(cpu, &memory, &swap))
    }

    /// Full sampling cycle including the process scan. Blocks for the CPU
    /// window, over which per-process CPU is measured too.
    pub fn sample(&self) -> Result<Sample, CollectorError> {
        let readings = self.collector.sample(self.cpu_window)?;
        let snapshot =
            SystemSnapshot::from_readings(readings.cpu_percent, &readings.memory, &readings.swap);
        let aggregation = Aggregation::from_readings(readings.processes);
        debug!(
            "[status] {} identities from {} processes ({} skipped)",
            aggregation.identity_count(),
            aggregation.records().len(),
            aggregation.skipped()
        );
        Ok(Sample {
            snapshot,
            aggregation,
        })
    }

    /// Ranking mode. Blocks for the CPU window so per-process CPU is measured.
    pub fn top_processes(&self, n: usize) -> Result<TopProcesses, CollectorError> {
        let sample = self.sample()?;
        Ok(top_n(&sample.aggregation, n))
    }

    /// Classify a sample and compose its insight.
    pub async fn build_report(&self, sample: &Sample) -> InsightReport {
        let snapshot = &sample.snapshot;
        let top = top_consumer(&sample.aggregation);
        let verdict = self.policy.classify(snapshot);
        let insight = self.composer.compose(verdict, snapshot, &top).await;
        debug!(
            "[status] verdict {verdict} (policy {}), top {} {}GB, insight {:?}",
            self.policy, top.name, top.memory_gb, insight.source
        );

        InsightReport {
            cpu_usage: round_percent(snapshot.cpu_percent),
            memory_usage: round_percent(snapshot.memory.percent),
            memory: MemoryBreakdown {
                total_gb: snapshot.memory.total_gb,
                used_gb: snapshot.memory.used_gb,
                free_gb: snapshot.memory.free_gb,
                available_gb: snapshot.memory.available_gb,
            },
            swap: snapshot.swap,
            top_process: TopProcess::from(&top),
            verdict,
            ai_insight: insight.text,
            insight_source: insight.source,
        }
    }

    /// Sample on the blocking pool, then build the report.
    pub async fn report(self: &Arc<Self>) -> Result<InsightReport, ServiceError> {
        let service = Arc::clone(self);
        let sample = tokio::task::spawn_blocking(move || service.sample())
            .await
            .map_err(|e| ServiceError::Sampling(e.to_string()))??;
        Ok(self.build_report(&sample).await)
    }

    /// [`StatusService::snapshot`] on the blocking pool.
    pub async fn snapshot_async(self: &Arc<Self>) -> Result<SystemSnapshot, ServiceError> {
        let service = Arc::clone(self);
        let snapshot = tokio::task::spawn_blocking(move || service.snapshot())
            .await
            .map_err(|e| ServiceError::Sampling(e.to_string()))??;
        Ok(snapshot)
    }

    /// [`StatusService::top_processes`] on the blocking pool.
    pub async fn top_processes_async(
        self: &Arc<Self>,
        n: usize,
    ) -> Result<TopProcesses, ServiceError> {
        let service = Arc::clone(self);
        let top = tokio::task::spawn_blocking(move || service.top_processes(n))
            .await
            .map_err(|e| ServiceError::Sampling(e.to_string()))??;
        Ok(top)
    }
}
