//! Integration tests for hostpulse-core.
//!
//! These tests run the full pipeline against the real host:
//! sysinfo collection → aggregation → selection → classification → report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hostpulse_core::{
    Aggregation, InsightComposer, MetricsCollector, PromptStyle, STABLE_MESSAGE, StatusService,
    SysinfoCollector, Verdict, VerdictPolicy, top_consumer,
};

fn host_service(policy: VerdictPolicy) -> Arc<StatusService> {
    Arc::new(StatusService::new(
        Arc::new(SysinfoCollector::new()),
        InsightComposer::offline(PromptStyle::Numbered),
        policy,
        Duration::from_millis(250),
        3,
    ))
}

#[test]
fn memory_counters_are_consistent() {
    let collector = SysinfoCollector::new();
    let vm = collector.virtual_memory().expect("memory counters");
    assert!(vm.total > 0);
    assert!(vm.available <= vm.total);
    assert!((0.0..=100.0).contains(&vm.percent));
}

#[test]
fn swap_counters_are_consistent() {
    let collector = SysinfoCollector::new();
    let swap = collector.swap_memory().expect("swap counters");
    assert!(swap.used <= swap.total || swap.total == 0);
    assert!((0.0..=100.0).contains(&swap.percent));
}

#[test]
fn process_scan_finds_this_process() {
    let collector = SysinfoCollector::new();
    let readings = collector.list_processes();
    let me = std::process::id();
    assert!(
        readings
            .iter()
            .any(|r| matches!(r, Ok(reading) if reading.pid == me)),
        "scan should include the test process itself"
    );
}

#[test]
fn aggregation_of_host_surfaces_a_consumer() {
    let collector = SysinfoCollector::new();
    let agg = Aggregation::from_readings(collector.list_processes());
    assert!(!agg.is_empty());
    assert!(agg.identity_count() <= agg.records().len());
    let top = top_consumer(&agg);
    assert!(!top.name.is_empty());
    assert!(top.memory_gb >= 0.0);
    assert!(
        agg.consumers()
            .iter()
            .all(|c| c.memory_gb <= top.memory_gb + 0.005)
    );
}

#[test]
fn cpu_percent_in_range() {
    let collector = SysinfoCollector::new();
    let cpu = collector
        .cpu_percent(Duration::from_millis(250))
        .expect("cpu sample");
    assert!((0.0..=100.0).contains(&cpu));
}

#[tokio::test]
async fn report_is_always_complete() {
    let service = host_service(VerdictPolicy::Memory);
    let report = service.report().await.expect("report");
    assert!((0.0..=100.0).contains(&report.cpu_usage));
    assert!((0.0..=100.0).contains(&report.memory_usage));
    assert!(!report.top_process.name.is_empty());
    assert!(!report.ai_insight.trim().is_empty());
    if report.verdict == Verdict::Normal {
        assert_eq!(report.ai_insight, STABLE_MESSAGE);
    }
}

#[tokio::test]
async fn both_policies_produce_reports() {
    for policy in [VerdictPolicy::Memory, VerdictPolicy::MemorySwap] {
        let report = host_service(policy).report().await.expect("report");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["verdict"].is_string());
    }
}

#[tokio::test]
async fn concurrent_reports_sample_independently() {
    let service = Arc::new(StatusService::new(
        Arc::new(SysinfoCollector::new()),
        InsightComposer::offline(PromptStyle::Numbered),
        VerdictPolicy::Memory,
        Duration::from_millis(500),
        3,
    ));
    let start = Instant::now();
    let (a, b, c, d) = tokio::join!(
        service.report(),
        service.report(),
        service.report(),
        service.report()
    );
    for report in [a, b, c, d] {
        assert!(!report.expect("report").ai_insight.is_empty());
    }
    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_millis(1600),
        "four 500ms reports took {elapsed:?}"
    );
}

#[test]
#[ignore] // Run with: cargo test -- --ignored
fn top_processes_ranked_with_default_window() {
    let service = Arc::new(StatusService::new(
        Arc::new(SysinfoCollector::new()),
        InsightComposer::offline(PromptStyle::Brief),
        VerdictPolicy::Memory,
        Duration::from_secs(1),
        3,
    ));
    let top = service.top_processes(3).expect("ranking");
    assert!(top.top_memory.len() <= 3);
    assert!(
        top.top_memory
            .windows(2)
            .all(|w| w[0].memory_gb >= w[1].memory_gb)
    );
    assert!(
        top.top_cpu
            .windows(2)
            .all(|w| w[0].cpu_percent >= w[1].cpu_percent)
    );
}
