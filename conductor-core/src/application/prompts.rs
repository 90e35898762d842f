//! Text templates for the two model calls of an agent turn.
//!
//! Both builders are pure: the same inputs always render the same prompt.

use crate::domain::{Memory, ToolDescriptor};

/// Prompt asking the model to pick exactly one tool, or answer in prose.
pub fn build_selection_prompt<'a, I>(query: &str, catalog: I, memory: &Memory) -> String
where
    I: IntoIterator<Item = &'a ToolDescriptor>,
{
    let mut lines = vec![
        "You are a helpful assistant with access to the tools and context listed below.".to_string(),
        String::new(),
        format!("CONTEXT: {}", render_memory(memory)),
        "TOOLS:".to_string(),
    ];

    let mut any_tool = false;
    for descriptor in catalog {
        any_tool = true;
        let schema = serde_json::to_string(&descriptor.input_schema).unwrap_or_default();
        lines.push(format!(
            "- {}: {}. Input schema: {}",
            descriptor.name,
            descriptor.description.trim(),
            schema
        ));
    }
    if !any_tool {
        lines.push("- (no tools are currently available)".to_string());
    }

    lines.extend([
        String::new(),
        "Choose the appropriate tool based on the user's question.".to_string(),
        format!("User's Question: {query}"),
        "If no tool is needed, reply directly in plain text.".to_string(),
        String::new(),
        "IMPORTANT: Always identify a single tool only.".to_string(),
        "IMPORTANT: When you need to use a tool, respond ONLY with the JSON object below and add no other comment.".to_string(),
        "Keep every argument value as a string, even numbers and booleans.".to_string(),
        "{\"tool\": \"tool-name\", \"arguments\": {\"argument-name\": \"value\"}}".to_string(),
    ]);
    lines.join("\n")
}

/// Prompt asking the model whether the user's request is now fully handled.
pub fn build_arbitration_prompt(query: &str, tool_response: &str, memory: &Memory) -> String {
    [
        "You are a helpful assistant. Decide whether to respond to the user now or to continue with another tool, based on the user's query, the tool's response and the conversation context.",
        "A query may contain several tasks; more than one tool may be needed to address all of them.",
        "If nothing else is needed, set action to \"respond_to_user\" and put a response in \"response\" that answers every part of the original query.",
        "If more work is needed (for example the query has two tasks and only one is handled), leave action empty and state in \"response\" what is still pending.",
        "Always answer with exactly this JSON format:",
        "{\"action\": \"\", \"response\": \"\"}",
    ]
    .iter()
    .map(|line| line.to_string())
    .chain([
        String::new(),
        "Inputs:".to_string(),
        format!("User's query: {query}"),
        format!("Tool response: {tool_response}"),
        format!("CONTEXT: {}", render_memory(memory)),
    ])
    .collect::<Vec<_>>()
    .join("\n")
}

fn render_memory(memory: &Memory) -> String {
    if memory.is_empty() {
        return "[]".to_string();
    }
    let quoted: Vec<String> = memory
        .iter()
        .map(|entry| serde_json::to_string(entry).unwrap_or_else(|_| format!("\"{entry}\"")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn time_tool() -> ToolDescriptor {
        ToolDescriptor::new(
            "TimeTool",
            "Returns the current time in a timezone",
            json!({"type": "object", "properties": {"input_timezone": {"type": "string"}}}),
        )
    }

    #[test]
    fn selection_prompt_embeds_catalog_query_and_memory() {
        let mut memory = Memory::default();
        memory.push("It is sunny in Dubai");
        let prompt =
            build_selection_prompt("What time is it in Asia/Kolkata?", [&time_tool()], &memory);

        assert!(prompt.contains("- TimeTool: Returns the current time in a timezone."));
        assert!(prompt.contains("\"input_timezone\""));
        assert!(prompt.contains("User's Question: What time is it in Asia/Kolkata?"));
        assert!(prompt.contains("CONTEXT: [\"It is sunny in Dubai\"]"));
        assert!(prompt.contains("single tool only"));
        assert!(prompt.contains("as a string"));
    }

    #[test]
    fn selection_prompt_is_deterministic() {
        let memory = Memory::default();
        let tool = time_tool();
        assert_eq!(
            build_selection_prompt("q", [&tool], &memory),
            build_selection_prompt("q", [&tool], &memory)
        );
    }

    #[test]
    fn arbitration_prompt_carries_tool_response_and_format() {
        let prompt = build_arbitration_prompt(
            "Weather in Dubai and my BMI",
            "Sunny, 38C",
            &Memory::default(),
        );
        assert!(prompt.contains("Tool response: Sunny, 38C"));
        assert!(prompt.contains("User's query: Weather in Dubai and my BMI"));
        assert!(prompt.contains("\"respond_to_user\""));
        assert!(prompt.contains("CONTEXT: []"));
    }
}
