mod cli;
mod stdio;

use clap::Parser;
use cli::{Cli, RunMode};
use conductor_core::Conductor;
use conductor_core::config::load_config;
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing(cli.mode == RunMode::Chat);
    info!("Starting mcp-conductor");
    debug!(
        mode = ?cli.mode,
        config = ?cli.config,
        bind = ?cli.bind,
        "CLI arguments parsed"
    );

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(system) = cli.system {
        info!("Overriding system prompt from CLI flag");
        config.model.system_prompt = system;
    }
    debug!(
        provider = %config.model.provider,
        model = %config.model.model,
        servers = config.servers.len(),
        "Configuration loaded"
    );

    let conductor = Conductor::from_config(&config).await;
    match cli.mode {
        RunMode::Serve => conductor.serve(cli.bind).await?,
        RunMode::Chat => stdio::run(conductor.sessions()).await?,
    }
    Ok(())
}

fn init_tracing(quiet: bool) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = if quiet {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
