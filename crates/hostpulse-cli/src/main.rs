//! CLI for hostpulse: live host pressure, a verdict and an insight.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hostpulse_core::{PromptStyle, VerdictPolicy};

#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(about = "hostpulse: live host pressure with a verdict and a one-glance insight")]
#[command(version = hostpulse_core::VERSION)]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options accepted by every subcommand. Unset flags keep the file value.
#[derive(Args, Debug, Default, Clone)]
pub struct SharedArgs {
    /// TOML config file
    #[arg(long, global = true, env = "HOSTPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verdict policy: memory (default) or memory-swap
    #[arg(long, global = true, env = "HOSTPULSE_POLICY")]
    pub policy: Option<VerdictPolicy>,

    /// Prompt style for generated insights: numbered (default) or brief
    #[arg(long, global = true, env = "HOSTPULSE_STYLE")]
    pub style: Option<PromptStyle>,

    /// Text generation API key. Without one, insights use local templates.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Text generation endpoint URL
    #[arg(long, global = true, env = "HOSTPULSE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Deadline for one generation call, in milliseconds
    #[arg(long, global = true, env = "HOSTPULSE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// CPU measurement window, in milliseconds
    #[arg(long, global = true, env = "HOSTPULSE_CPU_WINDOW_MS")]
    pub cpu_window_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP status server
    Serve {
        /// Host to bind to
        #[arg(long, env = "HOSTPULSE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "HOSTPULSE_PORT")]
        port: Option<u16>,
    },

    /// Sample the host once and print the report
    Status {
        /// Print the report as JSON, exactly as `GET /status` returns it
        #[arg(long)]
        json: bool,
    },

    /// Rank processes by memory and by CPU share
    Top {
        /// Entries per ranking (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the CPU, memory and swap snapshot as JSON
    Metrics,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = commands::load_config(&cli.shared)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve::run(&config)
        }
        Commands::Status { json } => commands::status::run(&config, json),
        Commands::Top { limit, json } => commands::top::run(&config, limit, json),
        Commands::Metrics => commands::metrics::run(&config),
    }
}
