use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Identity a tool server reports during the `initialize` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
}

impl ServerIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// A single tool invocation chosen by the model.
///
/// Argument values are always strings on this side of the boundary; they are
/// coerced against the tool's input schema right before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Renders the call in the directive shape the selection prompt asks for.
    pub fn to_directive(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"tool\":\"{}\"}}", self.tool))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VerdictAction {
    RespondToUser,
    Pending,
}

impl VerdictAction {
    pub fn as_str(self) -> &'static str {
        match self {
            VerdictAction::RespondToUser => "respond_to_user",
            VerdictAction::Pending => "",
        }
    }
}

impl TryFrom<String> for VerdictAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "respond_to_user" => Ok(VerdictAction::RespondToUser),
            "" => Ok(VerdictAction::Pending),
            other => Err(format!(
                "action must be \"respond_to_user\" or \"\", got \"{other}\""
            )),
        }
    }
}

impl From<VerdictAction> for String {
    fn from(value: VerdictAction) -> Self {
        value.as_str().to_string()
    }
}

/// Outcome of the arbitration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub action: VerdictAction,
    pub response: String,
}

impl Verdict {
    pub fn respond(response: impl Into<String>) -> Self {
        Self {
            action: VerdictAction::RespondToUser,
            response: response.into(),
        }
    }

    pub fn pending(response: impl Into<String>) -> Self {
        Self {
            action: VerdictAction::Pending,
            response: response.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.action == VerdictAction::RespondToUser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_directive_parses_back_to_equal_call() {
        let call = ToolCall::new("calculate_bmi")
            .with_argument("weight_kg", "70")
            .with_argument("height_m", "1.75");

        let parsed: ToolCall = serde_json::from_str(&call.to_directive()).expect("parse directive");
        assert_eq!(parsed, call);
    }

    #[test]
    fn tool_call_rejects_non_string_arguments() {
        let raw = json!({ "tool": "calculate_bmi", "arguments": { "weight_kg": 70 } });
        assert!(serde_json::from_value::<ToolCall>(raw).is_err());
    }

    #[test]
    fn verdict_action_accepts_only_two_values() {
        let done: Verdict =
            serde_json::from_str(r#"{"action":"respond_to_user","response":"ok"}"#).expect("parse");
        assert!(done.is_final());

        let pending: Verdict =
            serde_json::from_str(r#"{"action":"","response":"BMI still pending"}"#).expect("parse");
        assert_eq!(pending.action, VerdictAction::Pending);

        let unknown = serde_json::from_str::<Verdict>(r#"{"action":"continue","response":"x"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn descriptor_defaults_schema_when_absent() {
        let descriptor: ToolDescriptor =
            serde_json::from_value(json!({ "name": "TimeTool" })).expect("parse descriptor");
        assert_eq!(descriptor.description, "");
        assert_eq!(descriptor.input_schema["type"], "object");
    }
}
