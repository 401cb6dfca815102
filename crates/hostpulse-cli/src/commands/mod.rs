pub mod metrics;
pub mod serve;
pub mod status;
pub mod top;

use std::sync::Arc;

use anyhow::Context;
use hostpulse_core::{Config, StatusService, SysinfoCollector};

use crate::SharedArgs;

/// Load the config file (if any) and apply flag overrides on top.
pub fn load_config(args: &SharedArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&mut config, args);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &SharedArgs) {
    if let Some(policy) = args.policy {
        config.classifier.policy = policy;
    }
    if let Some(style) = args.style {
        config.insight.style = style;
    }
    if let Some(key) = &args.api_key {
        config.generator.api_key = Some(key.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.generator.endpoint = endpoint.clone();
    }
    if let Some(ms) = args.timeout_ms {
        config.insight.timeout_ms = ms;
    }
    if let Some(ms) = args.cpu_window_ms {
        config.sampling.cpu_window_ms = ms;
    }
}

/// Build a status service backed by the live host.
pub fn make_service(config: &Config) -> anyhow::Result<Arc<StatusService>> {
    let service = StatusService::from_config(config, Arc::new(SysinfoCollector::new()))
        .context("building status service")?;
    Ok(Arc::new(service))
}
