use super::coercion::coerce_arguments;
use super::error::ToolError;
use crate::application::registry::ToolRegistry;
use crate::application::tooling::ToolServerInterface;
use crate::domain::ToolCall;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Normalised result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub tool: String,
    pub server: String,
    pub text: String,
}

/// Routes a [`ToolCall`] to the binding that owns the tool.
#[derive(Clone)]
pub struct Dispatcher {
    bridge: Arc<dyn ToolServerInterface>,
}

impl Dispatcher {
    pub fn new(bridge: Arc<dyn ToolServerInterface>) -> Self {
        Self { bridge }
    }

    pub async fn execute(
        &self,
        call: &ToolCall,
        registry: &ToolRegistry,
    ) -> Result<ToolOutput, ToolError> {
        let Some(entry) = registry.lookup(&call.tool) else {
            warn!(requested_tool = %call.tool, "Unknown tool requested by agent");
            return Err(ToolError::UnknownTool(call.tool.clone()));
        };

        let arguments =
            coerce_arguments(&entry.descriptor.input_schema, &call.arguments).map_err(|reason| {
                warn!(tool = %call.tool, %reason, "Rejected tool arguments");
                ToolError::InvalidArguments {
                    tool: call.tool.clone(),
                    reason,
                }
            })?;

        let server = entry.binding.name.clone();
        debug!(tool = %call.tool, server = %server, "Dispatching tool via MCP");
        let raw = self
            .bridge
            .invoke_tool(&entry.binding, &call.tool, arguments)
            .await
            .map_err(|source| {
                warn!(tool = %call.tool, server = %server, %source, "Tool execution failed");
                ToolError::Execution {
                    tool: call.tool.clone(),
                    source,
                }
            })?;

        let text = extract_tool_text(&raw);
        if raw.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            let message = text.unwrap_or_else(|| "no error detail provided".to_string());
            warn!(tool = %call.tool, server = %server, %message, "Tool reported an error");
            return Err(ToolError::Failed {
                tool: call.tool.clone(),
                message,
            });
        }
        let Some(text) = text else {
            return Err(ToolError::Failed {
                tool: call.tool.clone(),
                message: "the result carried no text or structured content".to_string(),
            });
        };

        info!(tool = %call.tool, server = %server, "Tool executed");
        Ok(ToolOutput {
            tool: call.tool.clone(),
            server,
            text,
        })
    }
}

/// First non-empty text block, else the structured content as JSON.
pub fn extract_tool_text(result: &Value) -> Option<String> {
    if let Some(blocks) = result.get("content").and_then(Value::as_array) {
        for block in blocks {
            let is_text = block
                .get("type")
                .and_then(Value::as_str)
                .map(|kind| kind.eq_ignore_ascii_case("text"))
                .unwrap_or(true);
            if !is_text {
                continue;
            }
            if let Some(text) = block.get("text").and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    match result.get("structuredContent") {
        Some(Value::Null) | None => None,
        Some(structured) => serde_json::to_string(structured).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_first_non_empty_text_block() {
        let result = json!({
            "content": [
                {"type": "image", "data": "..."},
                {"type": "text", "text": "   "},
                {"type": "text", "text": "2025-01-01 10:00:00 IST"},
                {"type": "text", "text": "ignored"}
            ]
        });
        assert_eq!(
            extract_tool_text(&result).as_deref(),
            Some("2025-01-01 10:00:00 IST")
        );
    }

    #[test]
    fn falls_back_to_structured_content() {
        let result = json!({"content": [], "structuredContent": {"bmi": 22.86}});
        assert_eq!(extract_tool_text(&result).as_deref(), Some("{\"bmi\":22.86}"));
    }

    #[test]
    fn empty_result_has_no_text() {
        assert_eq!(extract_tool_text(&json!({"content": []})), None);
    }
}
