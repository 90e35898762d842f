// Shared stubs for the integration suites: an in-memory tool bridge and a
// scripted language model.
#![allow(dead_code)]

use async_trait::async_trait;
use conductor_core::config::ServerBinding;
use conductor_core::domain::{ServerIdentity, ToolDescriptor};
use conductor_core::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use conductor_core::tooling::{ServerCatalog, ToolInvokeError, ToolServerInterface};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves fixed catalogs per server name; unknown servers fail discovery.
#[derive(Default)]
pub struct StubBridge {
    catalogs: HashMap<String, Vec<ToolDescriptor>>,
    outputs: HashMap<String, String>,
    list_calls: AtomicUsize,
    invocations: Mutex<Vec<(String, String, Value)>>,
}

impl StubBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server: &str, tools: Vec<ToolDescriptor>) -> Self {
        self.catalogs.insert(server.to_string(), tools);
        self
    }

    pub fn with_output(mut self, tool: &str, text: &str) -> Self {
        self.outputs.insert(tool.to_string(), text.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// `(server, tool, arguments)` for every invocation, in order.
    pub fn invocations(&self) -> Vec<(String, String, Value)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolServerInterface for StubBridge {
    async fn list_tools(&self, binding: &ServerBinding) -> Result<ServerCatalog, ToolInvokeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match self.catalogs.get(&binding.name) {
            Some(tools) => Ok(ServerCatalog {
                identity: ServerIdentity::new(binding.name.clone(), "1.0.0"),
                instructions: None,
                tools: tools.clone(),
            }),
            None => Err(ToolInvokeError::Transport {
                server: binding.name.clone(),
                message: "connection refused".into(),
            }),
        }
    }

    async fn invoke_tool(
        &self,
        binding: &ServerBinding,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError> {
        self.invocations.lock().unwrap().push((
            binding.name.clone(),
            tool.to_string(),
            arguments.clone(),
        ));
        let text = self
            .outputs
            .get(tool)
            .cloned()
            .unwrap_or_else(|| format!("{tool} ran"));
        Ok(json!({ "content": [{ "type": "text", "text": text }], "isError": false }))
    }
}

/// Replies with queued completions and records every prompt it sees.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let prompt = request
            .messages
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => Ok(ModelResponse::new(reply)),
            None => Err(ModelError::invalid_response("scripted", "no reply queued")),
        }
    }
}

pub fn time_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "TimeTool",
        "Current time in a timezone",
        json!({
            "type": "object",
            "properties": { "input_timezone": { "type": "string" } }
        }),
    )
}

pub fn weather_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "weather_tool",
        "Current weather for a location",
        json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        }),
    )
}

pub fn bmi_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "calculate_bmi",
        "Body mass index from weight and height",
        json!({
            "type": "object",
            "properties": {
                "weight_kg": { "type": "number" },
                "height_m": { "type": "number" }
            },
            "required": ["weight_kg", "height_m"]
        }),
    )
}
