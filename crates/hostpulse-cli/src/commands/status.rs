use hostpulse_core::{Config, InsightReport, Verdict};

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let service = super::make_service(config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(service.report())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn verdict_marker(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Normal => "\u{2705}",
        Verdict::Strained => "\u{26A0}\u{FE0F}",
        Verdict::Overloaded => "\u{1F525}",
    }
}

/// Human-readable report.
fn render(report: &InsightReport) -> String {
    let mut out = String::new();
    let m = &report.memory;
    let s = &report.swap;
    out.push_str(&format!(
        "{} {}\n\n",
        verdict_marker(report.verdict),
        report.verdict
    ));
    out.push_str(&format!("  {:<10} {:>6.1}%\n", "CPU", report.cpu_usage));
    out.push_str(&format!(
        "  {:<10} {:>6.1}%   {} / {} GB used, {} GB available\n",
        "Memory", report.memory_usage, m.used_gb, m.total_gb, m.available_gb
    ));
    out.push_str(&format!(
        "  {:<10} {:>6.1}%   {} / {} GB used\n",
        "Swap", s.percent, s.used_gb, s.total_gb
    ));
    out.push_str(&format!(
        "  {:<10} {} ({} GB)\n\n",
        "Top", report.top_process.name, report.top_process.memory_gb
    ));
    for line in report.ai_insight.lines() {
        out.push_str(&format!("  {line}\n"));
    }
    out
}
