use super::model::ModelConfig;
use super::server::ServerBinding;
use crate::domain::memory::DEFAULT_MEMORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use utoipa::ToSchema;

pub const DEFAULT_MAX_TURNS: usize = 5;
pub const DEFAULT_FAREWELL: &str = "See you later!";
pub const DEFAULT_EXIT_KEYWORDS: [&str; 3] = ["exit", "bye", "close"];

/// Fully validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub agent: AgentSettings,
    pub gateway: GatewaySettings,
    pub servers: Vec<ServerBinding>,
}

/// When the tool catalog is (re)built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistryPolicy {
    /// Discover once at startup and share the snapshot across sessions.
    #[default]
    Shared,
    /// Rediscover every time a session opens.
    PerSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_turns: usize,
    pub memory_limit: usize,
    pub registry: RegistryPolicy,
    pub exit_keywords: Vec<String>,
    pub farewell: String,
    /// Upper bound applied to bindings that do not declare their own timeout.
    pub tool_timeout: Option<Duration>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            registry: RegistryPolicy::default(),
            exit_keywords: DEFAULT_EXIT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            farewell: DEFAULT_FAREWELL.to_string(),
            tool_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub bind: SocketAddr,
    pub allowed_origins: Vec<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8200)),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAgent {
    pub max_turns: Option<usize>,
    pub memory_limit: Option<usize>,
    pub registry: Option<RegistryPolicy>,
    pub exit_keywords: Option<Vec<String>>,
    pub farewell: Option<String>,
    pub tool_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawGateway {
    pub bind: Option<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}
