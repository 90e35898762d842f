use crate::application::registry::ToolRegistry;
use crate::config::{RegistryPolicy, TransportKind};
use crate::domain::ServerIdentity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub input_schema: Value,
    pub server: String,
    pub transport: TransportKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerStatus {
    pub name: String,
    pub identity: ServerIdentity,
    pub tool_count: usize,
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscoveryFailure {
    pub server: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShadowedEntry {
    pub tool: String,
    pub kept_server: String,
    pub shadowed_server: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolInventoryResponse {
    pub discovered_at: DateTime<Utc>,
    pub policy: RegistryPolicy,
    pub tools: Vec<ToolEntry>,
    pub servers: Vec<ServerStatus>,
    pub failures: Vec<DiscoveryFailure>,
    pub shadowed: Vec<ShadowedEntry>,
}

impl ToolInventoryResponse {
    pub fn from_registry(registry: &ToolRegistry, policy: RegistryPolicy) -> Self {
        Self {
            discovered_at: registry.discovered_at(),
            policy,
            tools: registry
                .entries()
                .iter()
                .map(|entry| ToolEntry {
                    name: entry.descriptor.name.clone(),
                    description: entry.descriptor.description.clone(),
                    input_schema: entry.descriptor.input_schema.clone(),
                    server: entry.binding.name.clone(),
                    transport: entry.binding.kind(),
                })
                .collect(),
            servers: registry
                .servers()
                .iter()
                .map(|server| ServerStatus {
                    name: server.name.clone(),
                    identity: server.identity.clone(),
                    tool_count: server.tool_count,
                    instructions: server.instructions.clone(),
                })
                .collect(),
            failures: registry
                .failures()
                .iter()
                .map(|failure| DiscoveryFailure {
                    server: failure.server.clone(),
                    message: failure.message.clone(),
                })
                .collect(),
            shadowed: registry
                .shadowed()
                .iter()
                .map(|shadowed| ShadowedEntry {
                    tool: shadowed.tool.clone(),
                    kept_server: shadowed.kept_server.clone(),
                    shadowed_server: shadowed.shadowed_server.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub tools: usize,
    pub failed_servers: usize,
}
