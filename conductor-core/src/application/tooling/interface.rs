use super::error::ToolInvokeError;
use crate::config::ServerBinding;
use crate::domain::{ServerIdentity, ToolDescriptor};
use async_trait::async_trait;
use serde_json::Value;

/// What one server advertised during discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCatalog {
    pub identity: ServerIdentity,
    pub instructions: Option<String>,
    pub tools: Vec<ToolDescriptor>,
}

/// Seam between the orchestration core and live tool servers.
///
/// Each call opens its own connection and releases it before returning.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    async fn list_tools(&self, binding: &ServerBinding) -> Result<ServerCatalog, ToolInvokeError>;

    async fn invoke_tool(
        &self,
        binding: &ServerBinding,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError>;
}
