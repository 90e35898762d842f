use crate::config::ServerBinding;
use crate::domain::{ServerIdentity, ToolDescriptor};
use std::sync::Arc;
use thiserror::Error;

/// One addressable tool and the binding that owns it.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub binding: Arc<ServerBinding>,
    pub identity: ServerIdentity,
    pub descriptor: ToolDescriptor,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// A server that answered discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    pub name: String,
    pub identity: ServerIdentity,
    pub instructions: Option<String>,
    pub tool_count: usize,
}

/// A binding excluded from the registry because discovery failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discovery failed for server '{server}': {message}")]
pub struct DiscoveryError {
    pub server: String,
    pub message: String,
}

/// A tool hidden because an earlier binding already exposes the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedTool {
    pub tool: String,
    pub kept_server: String,
    pub shadowed_server: String,
}
