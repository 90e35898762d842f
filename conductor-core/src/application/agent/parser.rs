use super::errors::AgentError;
use crate::domain::{ToolCall, Verdict};
use serde_json::Value;

/// What the selection step decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Call(ToolCall),
    /// The model answered directly; no tool is needed.
    Direct(String),
}

/// Interpret selection output. Text without a JSON object carrying a `tool`
/// field is a direct answer; such an object that does not decode is an error.
pub fn parse_selection(content: &str) -> Result<Selection, AgentError> {
    let Some(value) = extract_json(content) else {
        return Ok(Selection::Direct(content.trim().to_string()));
    };
    if value.get("tool").is_none() {
        return Ok(Selection::Direct(content.trim().to_string()));
    }
    let call: ToolCall = serde_json::from_value(value)
        .map_err(|err| AgentError::parse("tool call", err.to_string()))?;
    if call.tool.trim().is_empty() {
        return Err(AgentError::parse("tool call", "tool name is empty"));
    }
    Ok(Selection::Call(call))
}

pub fn parse_verdict(content: &str) -> Result<Verdict, AgentError> {
    let value = extract_json(content)
        .ok_or_else(|| AgentError::parse("verdict", "expected JSON object in model response"))?;
    serde_json::from_value(value).map_err(|err| AgentError::parse("verdict", err.to_string()))
}

/// Locate a JSON object in model output: the whole text, a fenced block, or
/// the span between the outermost braces.
pub(crate) fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if trimmed.starts_with("```") {
        let stripped = trimmed.trim_start_matches("```json");
        let stripped = stripped.trim_start_matches("```JSON");
        let stripped = stripped.trim_start_matches("```");
        if let Some(end) = stripped.rfind("```") {
            let fenced = stripped[..end].trim();
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(fenced) {
                return Some(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            let braced = &trimmed[start..=end];
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(braced) {
                return Some(value);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_directive_becomes_tool_call() {
        let selection =
            parse_selection(r#"{"tool":"TimeTool","arguments":{"input_timezone":"Asia/Kolkata"}}"#)
                .expect("parses");
        assert_eq!(
            selection,
            Selection::Call(
                ToolCall::new("TimeTool").with_argument("input_timezone", "Asia/Kolkata")
            )
        );
    }

    #[test]
    fn fenced_directive_with_chatter_is_accepted() {
        let content = "Sure!\n```json\n{\"tool\": \"weather_tool\", \"arguments\": {\"location\": \"Dubai\"}}\n```";
        let selection = parse_selection(content).expect("parses");
        assert!(matches!(selection, Selection::Call(call) if call.tool == "weather_tool"));
    }

    #[test]
    fn prose_is_a_direct_answer() {
        let selection = parse_selection("  Hello! How can I help you today?  ").expect("parses");
        assert_eq!(
            selection,
            Selection::Direct("Hello! How can I help you today?".into())
        );
    }

    #[test]
    fn non_string_argument_values_fail_fast() {
        let err = parse_selection(r#"{"tool":"calculate_bmi","arguments":{"weight_kg":70}}"#)
            .expect_err("strict decode");
        assert!(matches!(err, AgentError::ModelParse { expected: "tool call", .. }));
    }

    #[test]
    fn verdict_parses_from_surrounding_text() {
        let verdict = parse_verdict(
            "Here you go: {\"action\": \"\", \"response\": \"BMI is still pending\"} thanks",
        )
        .expect("parses");
        assert_eq!(verdict, Verdict::pending("BMI is still pending"));
        assert!(!verdict.is_final());
    }

    #[test]
    fn verdict_without_json_is_an_error() {
        assert!(parse_verdict("The weather in Dubai is sunny.").is_err());
    }
}
