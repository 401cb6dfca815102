use hostpulse_core::Config;

pub fn run(config: &Config) -> anyhow::Result<()> {
    let service = super::make_service(config)?;
    let host = &config.server.host;
    let port = config.server.port;
    let base = format!("http://{host}:{port}");

    println!("hostpulse server v{}", hostpulse_core::VERSION);
    println!("   {base}");
    println!(
        "   policy {}, prompt style {}, collector {}",
        service.policy(),
        service.style(),
        service.collector_name()
    );
    if service.has_generator() {
        println!("   insights: generated (timeout {} ms)", config.insight.timeout_ms);
    } else {
        println!("   insights: local templates (no API key)");
    }
    println!();
    println!("   Endpoints:");
    println!("     GET /                 API index (try: curl {base})");
    println!("     GET /status           Verdict, readings, top process and insight");
    println!("     GET /metrics          CPU, memory and swap snapshot");
    println!("     GET /processes/top    Ranking by memory and CPU");
    println!("     GET /health           Health check");
    println!();
    println!("   Query params for /processes/top:");
    println!("     limit=N               Entries per ranking (1-50, default: {})", service.top_n_default());
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(hostpulse_server::run_server(service, host, port))?;
    Ok(())
}
