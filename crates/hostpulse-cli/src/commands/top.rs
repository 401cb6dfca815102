use hostpulse_core::{Config, MAX_TOP_N, ProcessRecord, TopProcesses};

pub fn run(config: &Config, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let service = super::make_service(config)?;
    let n = effective_limit(limit, service.top_n_default());
    let top = service.top_processes(n)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&top)?);
    } else {
        print!("{}", render(&top));
    }
    Ok(())
}

fn effective_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_TOP_N)
}

fn table(title: &str, records: &[ProcessRecord]) -> String {
    let mut out = format!("{title}\n");
    out.push_str(&format!(
        "  {:>8}  {:<24} {:>10} {:>8}\n",
        "PID", "NAME", "MEM (GB)", "CPU %"
    ));
    for r in records {
        out.push_str(&format!(
            "  {:>8}  {:<24} {:>10.2} {:>8.1}\n",
            r.pid, r.name, r.memory_gb, r.cpu_percent
        ));
    }
    if records.is_empty() {
        out.push_str("  (no readable processes)\n");
    }
    out
}

fn render(top: &TopProcesses) -> String {
    let mut out = table("Top by memory", &top.top_memory);
    out.push('\n');
    out.push_str(&table("Top by CPU", &top.top_cpu));
    out
}
