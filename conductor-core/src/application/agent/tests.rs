use super::*;
use crate::application::dispatch::Dispatcher;
use crate::application::registry::ToolRegistry;
use crate::application::tooling::{ServerCatalog, ToolInvokeError, ToolServerInterface};
use crate::config::ServerBinding;
use crate::domain::{Memory, ServerIdentity, ToolDescriptor};
use crate::infrastructure::model::{
    ModelError, ModelGateway, ModelProvider, ModelRequest, ModelResponse,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct StubBridge {
    calls: Mutex<Vec<(String, Value)>>,
}

impl StubBridge {
    async fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ToolServerInterface for StubBridge {
    async fn list_tools(&self, binding: &ServerBinding) -> Result<ServerCatalog, ToolInvokeError> {
        Ok(ServerCatalog {
            identity: ServerIdentity::new(binding.name.clone(), "1.0"),
            instructions: None,
            tools: Vec::new(),
        })
    }

    async fn invoke_tool(
        &self,
        _binding: &ServerBinding,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError> {
        self.calls.lock().await.push((tool.to_string(), arguments.clone()));
        let text = match tool {
            "TimeTool" => "2025-03-14 18:30:00 IST+0530".to_string(),
            "weather_tool" => "Dubai: Sunny, 38°C".to_string(),
            "calculate_bmi" => {
                let weight = arguments["weight_kg"].as_f64().unwrap_or_default();
                let height = arguments["height_m"].as_f64().unwrap_or(1.0);
                format!("{:.2}", weight / (height * height))
            }
            other => format!("{other} ran"),
        };
        Ok(json!({ "content": [{ "type": "text", "text": text }], "isError": false }))
    }
}

struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    recordings: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            recordings: Mutex::new(Vec::new()),
        })
    }

    async fn prompts(&self) -> Vec<String> {
        self.recordings
            .lock()
            .await
            .iter()
            .map(|request| request.messages.last().map(|m| m.content.clone()).unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.recordings.lock().await.push(request);
        let next = self
            .responses
            .lock()
            .await
            .pop_front()
            .expect("scripted provider ran out of responses");
        Ok(ModelResponse::new(next))
    }
}

/// Always selects a tool and never declares the request satisfied.
struct NeverSatisfiedProvider;

#[async_trait]
impl ModelProvider for NeverSatisfiedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let prompt = request.messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        if prompt.contains("User's Question:") {
            Ok(ModelResponse::new(
                r#"{"tool":"TimeTool","arguments":{"input_timezone":"UTC"}}"#,
            ))
        } else {
            Ok(ModelResponse::new(r#"{"action":"","response":"still more to do"}"#))
        }
    }
}

struct FailingProvider;

#[async_trait]
impl ModelProvider for FailingProvider {
    async fn chat(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
        Err(ModelError::invalid_response("stub", "boom"))
    }
}

fn registry() -> ToolRegistry {
    let catalog = |server: &str, tools: Vec<ToolDescriptor>| ServerCatalog {
        identity: ServerIdentity::new(server, "1.0"),
        instructions: None,
        tools,
    };
    ToolRegistry::from_results(vec![
        (
            ServerBinding::event_stream("weather-time", "http://localhost:8100/sse"),
            Ok(catalog(
                "weather-time",
                vec![
                    ToolDescriptor::new(
                        "TimeTool",
                        "Current time in a timezone",
                        json!({"type":"object","properties":{"input_timezone":{"type":"string"}}}),
                    ),
                    ToolDescriptor::new(
                        "weather_tool",
                        "Current weather for a location",
                        json!({"type":"object","properties":{"location":{"type":"string"}},"required":["location"]}),
                    ),
                ],
            )),
        ),
        (
            ServerBinding::stdio("bmi", "python", vec!["bmi_server.py".into()]),
            Ok(catalog(
                "bmi",
                vec![ToolDescriptor::new(
                    "calculate_bmi",
                    "Body mass index from weight and height",
                    json!({
                        "type":"object",
                        "properties":{"weight_kg":{"type":"number"},"height_m":{"type":"number"}},
                        "required":["weight_kg","height_m"]
                    }),
                )],
            )),
        ),
    ])
}

fn agent(provider: Arc<dyn ModelProvider>, bridge: Arc<StubBridge>, max_turns: usize) -> Agent {
    Agent::new(
        ModelGateway::new(provider, "test-model", "system"),
        Dispatcher::new(bridge),
        AgentOptions { max_turns },
    )
}

#[tokio::test]
async fn direct_answer_skips_tools() {
    let provider = ScriptedProvider::new(vec!["Hello! I can tell you the time or weather."]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider.clone(), bridge.clone(), 5)
        .run("hi there", &registry(), &mut memory)
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "Hello! I can tell you the time or weather.");
    assert!(outcome.steps.is_empty());
    assert_eq!(outcome.turns, 1);
    assert!(bridge.calls().await.is_empty());
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn single_tool_round_answers_time_query() {
    let provider = ScriptedProvider::new(vec![
        r#"{"tool":"TimeTool","arguments":{"input_timezone":"Asia/Kolkata"}}"#,
        r#"{"action":"respond_to_user","response":"It is 18:30 in Asia/Kolkata."}"#,
    ]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider.clone(), bridge.clone(), 5)
        .run("What time is it in Asia/Kolkata?", &registry(), &mut memory)
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "It is 18:30 in Asia/Kolkata.");
    assert_eq!(outcome.steps.len(), 1);
    assert!(outcome.steps[0].success);
    assert!(outcome.steps[0].output.contains("18:30:00"));

    let calls = bridge.calls().await;
    assert_eq!(calls, vec![("TimeTool".to_string(), json!({"input_timezone": "Asia/Kolkata"}))]);

    let prompts = provider.prompts().await;
    assert!(prompts[0].contains("User's Question: What time is it in Asia/Kolkata?"));
    assert!(prompts[1].contains("Tool response: 2025-03-14 18:30:00 IST+0530"));
    assert_eq!(memory.iter().collect::<Vec<_>>(), vec!["It is 18:30 in Asia/Kolkata."]);
}

#[tokio::test]
async fn multi_part_query_loops_until_satisfied() {
    let provider = ScriptedProvider::new(vec![
        r#"{"tool":"weather_tool","arguments":{"location":"Dubai"}}"#,
        r#"{"action":"","response":"Weather in Dubai is sunny, 38°C. Pending: BMI for 70kg and 1.75m."}"#,
        r#"{"tool":"calculate_bmi","arguments":{"weight_kg":"70","height_m":"1.75"}}"#,
        r#"{"action":"respond_to_user","response":"Dubai is sunny at 38°C and your BMI is 22.86."}"#,
    ]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider.clone(), bridge.clone(), 5)
        .run(
            "What's the weather in Dubai and the BMI for 70kg/1.75m?",
            &registry(),
            &mut memory,
        )
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.response, "Dubai is sunny at 38°C and your BMI is 22.86.");
    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[1].output, "22.86");

    let calls = bridge.calls().await;
    assert_eq!(calls[1].1, json!({"weight_kg": 70.0, "height_m": 1.75}));

    let prompts = provider.prompts().await;
    assert!(prompts[2].contains("User's Question: Weather in Dubai is sunny, 38°C. Pending: BMI"));
    assert!(prompts[2].contains("CONTEXT: [\"Weather in Dubai is sunny"));
    assert_eq!(memory.len(), 2);
}

#[tokio::test]
async fn never_satisfied_model_hits_turn_limit() {
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let err = agent(Arc::new(NeverSatisfiedProvider), bridge.clone(), 3)
        .run("loop forever", &registry(), &mut memory)
        .await
        .expect_err("turn limit");

    match err {
        AgentError::TurnLimit { turns, pending } => {
            assert_eq!(turns, 3);
            assert_eq!(pending, "still more to do");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(bridge.calls().await.len(), 3);
}

#[tokio::test]
async fn unknown_tool_is_reported_to_arbitration() {
    let provider = ScriptedProvider::new(vec![
        r#"{"tool":"stock_price","arguments":{"symbol":"ACME"}}"#,
        r#"{"action":"respond_to_user","response":"I cannot look up stock prices."}"#,
    ]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider.clone(), bridge.clone(), 5)
        .run("ACME stock price?", &registry(), &mut memory)
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "I cannot look up stock prices.");
    assert!(!outcome.steps[0].success);
    assert!(bridge.calls().await.is_empty());
    let prompts = provider.prompts().await;
    assert!(prompts[1].contains("Tool response: Tool error:"));
    assert!(prompts[1].contains("stock_price"));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_server() {
    let provider = ScriptedProvider::new(vec![
        r#"{"tool":"calculate_bmi","arguments":{"weight_kg":"heavy","height_m":"1.75"}}"#,
        r#"{"action":"respond_to_user","response":"Please give your weight in kilograms."}"#,
    ]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider, bridge.clone(), 5)
        .run("BMI please", &registry(), &mut memory)
        .await
        .expect("agent succeeds");

    assert!(!outcome.steps[0].success);
    assert!(outcome.steps[0].output.contains("weight_kg"));
    assert!(bridge.calls().await.is_empty());
}

#[tokio::test]
async fn unreadable_verdict_is_returned_as_final_text() {
    let provider = ScriptedProvider::new(vec![
        r#"{"tool":"TimeTool","arguments":{"input_timezone":"UTC"}}"#,
        "It is currently 13:00 UTC.",
    ]);
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let outcome = agent(provider, bridge, 5)
        .run("time in UTC", &registry(), &mut memory)
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "It is currently 13:00 UTC.");
}

#[tokio::test]
async fn model_failure_aborts_the_turn() {
    let bridge = Arc::new(StubBridge::default());
    let mut memory = Memory::default();

    let err = agent(Arc::new(FailingProvider), bridge, 5)
        .run("hello", &registry(), &mut memory)
        .await
        .expect_err("model error");

    assert!(matches!(err, AgentError::Model(_)));
    assert!(err.user_message().starts_with("Sorry"));
    assert!(memory.is_empty());
}
