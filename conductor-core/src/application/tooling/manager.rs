use super::connection::McpConnection;
use super::error::ToolInvokeError;
use super::interface::{ServerCatalog, ToolServerInterface};
use crate::config::ServerBinding;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Production [`ToolServerInterface`]: one fresh connection per operation,
/// every step bounded by the binding's timeout.
#[derive(Clone, Default)]
pub struct ServerManager {
    client: Client,
}

impl ServerManager {
    pub fn new() -> Self {
        Self::default()
    }

    async fn open(&self, binding: &ServerBinding) -> Result<McpConnection, ToolInvokeError> {
        match timeout(binding.timeout, McpConnection::connect(binding, &self.client)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(server = %binding.name, "Timed out connecting to MCP server");
                Err(timed_out(binding))
            }
        }
    }

    async fn bounded<T, F>(
        &self,
        binding: &ServerBinding,
        connection: &McpConnection,
        operation: F,
    ) -> Result<T, ToolInvokeError>
    where
        F: Future<Output = Result<T, ToolInvokeError>>,
    {
        let outcome = timeout(binding.timeout, operation).await;
        connection.close().await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(server = %binding.name, "Timed out waiting for MCP server");
                Err(timed_out(binding))
            }
        }
    }
}

fn timed_out(binding: &ServerBinding) -> ToolInvokeError {
    ToolInvokeError::Timeout {
        server: binding.name.clone(),
        timeout: binding.timeout,
    }
}

#[async_trait]
impl ToolServerInterface for ServerManager {
    async fn list_tools(&self, binding: &ServerBinding) -> Result<ServerCatalog, ToolInvokeError> {
        let connection = self.open(binding).await?;
        let tools = self
            .bounded(binding, &connection, connection.list_tools())
            .await?;
        debug!(server = %binding.name, count = tools.len(), "Discovered tools");
        Ok(ServerCatalog {
            identity: connection.identity().clone(),
            instructions: connection.instructions().map(str::to_string),
            tools,
        })
    }

    async fn invoke_tool(
        &self,
        binding: &ServerBinding,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError> {
        let connection = self.open(binding).await?;
        debug!(server = %binding.name, tool, "Invoking tool");
        self.bounded(binding, &connection, connection.call_tool(tool, arguments))
            .await
    }
}
