use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-conductor",
    version,
    about = "Agentic orchestration over MCP tool servers"
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    /// Override the system prompt from the configuration
    #[arg(long)]
    pub system: Option<String>,
    #[arg(long, short, value_enum, default_value_t = RunMode::Serve)]
    pub mode: RunMode,
    /// Listen address for the gateway; defaults to `[gateway].bind`
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// WebSocket gateway with the inventory endpoints
    Serve,
    /// Interactive terminal chat
    Chat,
}
