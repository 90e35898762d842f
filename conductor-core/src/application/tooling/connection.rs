use super::error::ToolInvokeError;
use super::event_stream::EventStreamTransport;
use super::process::StdioTransport;
use super::rpc::{FrameSink, RpcState};
use crate::config::{ServerBinding, ServerTransport};
use crate::constants::PROTOCOL_VERSION;
use crate::domain::{ServerIdentity, ToolDescriptor};
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

enum TransportHandle {
    Stdio(StdioTransport),
    EventStream(EventStreamTransport),
}

impl TransportHandle {
    fn sink(&self) -> &dyn FrameSink {
        match self {
            TransportHandle::Stdio(transport) => transport.sink(),
            TransportHandle::EventStream(transport) => transport.sink(),
        }
    }

    async fn close(&self) {
        match self {
            TransportHandle::Stdio(transport) => transport.close().await,
            TransportHandle::EventStream(transport) => transport.close(),
        }
    }
}

/// A live, initialised session with one tool server.
pub struct McpConnection {
    rpc: Arc<RpcState>,
    transport: TransportHandle,
    identity: ServerIdentity,
    instructions: Option<String>,
}

impl McpConnection {
    /// Open the binding's transport and perform the MCP handshake.
    pub async fn connect(
        binding: &ServerBinding,
        client: &Client,
    ) -> Result<Self, ToolInvokeError> {
        let rpc = Arc::new(RpcState::new(binding.name.clone()));
        let transport = match &binding.transport {
            ServerTransport::Stdio(params) => {
                TransportHandle::Stdio(StdioTransport::spawn(params, Arc::clone(&rpc))?)
            }
            ServerTransport::EventStream(params) => TransportHandle::EventStream(
                EventStreamTransport::open(client, params, Arc::clone(&rpc)).await?,
            ),
        };

        let mut connection = Self {
            rpc,
            transport,
            identity: ServerIdentity::new(binding.name.clone(), "unknown"),
            instructions: None,
        };
        if let Err(err) = connection.initialize().await {
            connection.close().await;
            return Err(err);
        }
        Ok(connection)
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Fetch the full tool catalog, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let mut tools = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            if let Some(entries) = result.get("tools").and_then(Value::as_array) {
                for entry in entries {
                    match serde_json::from_value::<ToolDescriptor>(entry.clone()) {
                        Ok(descriptor) => tools.push(descriptor),
                        Err(err) => warn!(
                            server = %self.rpc.server(),
                            %err,
                            "Skipping malformed tool descriptor"
                        ),
                    }
                }
            }

            match result.get("nextCursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() && seen_cursors.insert(next.to_string()) => {
                    cursor = Some(next.to_string());
                }
                _ => break,
            }
        }

        debug!(server = %self.rpc.server(), count = tools.len(), "Listed tools");
        Ok(tools)
    }

    /// Invoke one tool; the raw `tools/call` result is returned unchanged.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let params = json!({
            "name": name,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        self.request("tools/call", params).await
    }

    /// Release the transport and fail anything still in flight.
    pub async fn close(&self) {
        self.transport.close().await;
        self.rpc.fail_all().await;
        debug!(server = %self.rpc.server(), "Connection closed");
    }

    async fn initialize(&mut self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let result = self.request("initialize", params).await?;

        if let Some(info) = result.get("serverInfo") {
            let name = info
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(self.rpc.server());
            let version = info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            self.identity = ServerIdentity::new(name, version);
        }
        self.instructions = result
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string);

        self.rpc
            .notify(self.transport.sink(), "notifications/initialized", json!({}))
            .await?;
        debug!(server = %self.rpc.server(), identity = %self.identity, "Handshake complete");
        Ok(())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        self.rpc.request(self.transport.sink(), method, params).await
    }
}
