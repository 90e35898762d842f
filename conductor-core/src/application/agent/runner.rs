use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use super::parser::{Selection, parse_selection, parse_verdict};
use crate::application::dispatch::Dispatcher;
use crate::application::prompts::{build_arbitration_prompt, build_selection_prompt};
use crate::application::registry::ToolRegistry;
use crate::domain::{Memory, ToolCall, Verdict};
use crate::infrastructure::model::ModelGateway;
use tracing::{debug, info, warn};

enum AgentState {
    Selecting { query: String },
    Executing { query: String, call: ToolCall },
    Arbitrating { query: String, tool_response: String },
    Done { response: String },
}

/// Drives select → execute → arbitrate rounds until the model decides the
/// user can be answered.
#[derive(Clone)]
pub struct Agent {
    gateway: ModelGateway,
    dispatcher: Dispatcher,
    options: AgentOptions,
}

impl Agent {
    pub fn new(gateway: ModelGateway, dispatcher: Dispatcher, options: AgentOptions) -> Self {
        Self {
            gateway,
            dispatcher,
            options,
        }
    }

    pub fn options(&self) -> AgentOptions {
        self.options
    }

    pub async fn run(
        &self,
        query: &str,
        registry: &ToolRegistry,
        memory: &mut Memory,
    ) -> Result<AgentOutcome, AgentError> {
        info!(tools = registry.len(), "Agent run started");
        let mut steps = Vec::new();
        let mut turns = 0;
        let mut state = AgentState::Selecting {
            query: query.to_string(),
        };

        loop {
            state = match state {
                AgentState::Selecting { query } => {
                    if turns >= self.options.max_turns {
                        warn!(turns, "Agent exceeded the turn limit");
                        return Err(AgentError::TurnLimit {
                            turns,
                            pending: query,
                        });
                    }
                    turns += 1;
                    debug!(turn = turns, "Selecting tool");

                    let prompt = build_selection_prompt(&query, registry.catalog(), memory);
                    let raw = self.gateway.complete(&prompt).await?;
                    match parse_selection(&raw)? {
                        Selection::Call(call) => {
                            info!(tool = %call.tool, "Agent requested tool execution");
                            AgentState::Executing { query, call }
                        }
                        Selection::Direct(response) => {
                            debug!("Model answered without a tool");
                            memory.push(response.clone());
                            AgentState::Done { response }
                        }
                    }
                }
                AgentState::Executing { query, call } => {
                    let (success, tool_response) =
                        match self.dispatcher.execute(&call, registry).await {
                            Ok(output) => (true, output.text),
                            Err(err) => {
                                warn!(
                                    tool = %call.tool,
                                    %err,
                                    "Tool step failed; reporting to arbitration"
                                );
                                (false, format!("Tool error: {}", err.user_message()))
                            }
                        };
                    steps.push(AgentStep {
                        tool: call.tool,
                        arguments: call.arguments,
                        success,
                        output: tool_response.clone(),
                    });
                    AgentState::Arbitrating {
                        query,
                        tool_response,
                    }
                }
                AgentState::Arbitrating {
                    query,
                    tool_response,
                } => {
                    let prompt = build_arbitration_prompt(&query, &tool_response, memory);
                    let raw = self.gateway.complete(&prompt).await?;
                    let verdict = parse_verdict(&raw).unwrap_or_else(|err| {
                        warn!(%err, "Arbitration output unreadable; answering with raw text");
                        Verdict::respond(raw.trim())
                    });
                    memory.push(verdict.response.clone());

                    if verdict.is_final() {
                        AgentState::Done {
                            response: verdict.response,
                        }
                    } else {
                        debug!(pending = %verdict.response, "Request not yet satisfied");
                        AgentState::Selecting {
                            query: verdict.response,
                        }
                    }
                }
                AgentState::Done { response } => {
                    info!(turns, steps = steps.len(), "Agent run finished");
                    return Ok(AgentOutcome {
                        response,
                        steps,
                        turns,
                    });
                }
            };
        }
    }
}
