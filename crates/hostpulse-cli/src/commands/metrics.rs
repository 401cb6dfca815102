use hostpulse_core::Config;

pub fn run(config: &Config) -> anyhow::Result<()> {
    let service = super::make_service(config)?;
    let snapshot = service.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
