//! Application constants
//!
//! Single source of truth for paths and protocol defaults.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/conductor.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// MCP protocol revision sent during `initialize`
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Prefix applied to every outbound agent frame on a user channel
pub const AGENT_PREFIX: &str = "Agent: ";
