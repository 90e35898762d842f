use crate::application::agent::Agent;
use crate::application::registry::ToolRegistry;
use crate::constants::AGENT_PREFIX;
use crate::domain::Memory;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// What a session sends back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReply {
    Message(String),
    /// The user asked to leave; the channel should close after sending this.
    Farewell(String),
    /// Blank input; nothing to send.
    Ignored,
}

impl SessionReply {
    /// Text for the user channel, prefixed for display.
    pub fn render(&self) -> Option<String> {
        match self {
            SessionReply::Message(text) | SessionReply::Farewell(text) => {
                Some(format!("{AGENT_PREFIX}{text}"))
            }
            SessionReply::Ignored => None,
        }
    }

    pub fn is_farewell(&self) -> bool {
        matches!(self, SessionReply::Farewell(_))
    }
}

#[derive(Debug, Clone)]
pub(super) struct SessionRules {
    pub exit_keywords: Arc<[String]>,
    pub farewell: Arc<str>,
}

/// One user's conversation: its own memory and registry snapshot.
pub struct Session {
    id: Uuid,
    opened_at: DateTime<Utc>,
    memory: Memory,
    registry: Arc<ToolRegistry>,
    agent: Agent,
    rules: SessionRules,
}

impl Session {
    pub(super) fn new(
        registry: Arc<ToolRegistry>,
        agent: Agent,
        memory_limit: usize,
        rules: SessionRules,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            memory: Memory::new(memory_limit),
            registry,
            agent,
            rules,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn is_termination(&self, input: &str) -> bool {
        let normalized = input.trim();
        self.rules
            .exit_keywords
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(normalized))
    }

    pub async fn handle(&mut self, input: &str) -> SessionReply {
        let input = input.trim();
        if input.is_empty() {
            return SessionReply::Ignored;
        }
        if self.is_termination(input) {
            info!(session_id = %self.id, "User ended the session");
            return SessionReply::Farewell(self.rules.farewell.to_string());
        }

        match self.agent.run(input, &self.registry, &mut self.memory).await {
            Ok(outcome) => {
                info!(
                    session_id = %self.id,
                    turns = outcome.turns,
                    tools = outcome.steps.len(),
                    "Turn completed"
                );
                SessionReply::Message(outcome.response)
            }
            Err(err) => {
                error!(session_id = %self.id, %err, "Agent turn failed");
                SessionReply::Message(err.user_message())
            }
        }
    }
}
