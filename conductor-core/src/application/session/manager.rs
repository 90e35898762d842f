use super::conversation::{Session, SessionRules};
use crate::application::agent::Agent;
use crate::application::registry::RegistrySource;
use crate::config::AgentSettings;
use std::sync::Arc;
use tracing::info;

/// Opens independent sessions that share only the agent and registry source.
pub struct SessionManager {
    registry: Arc<RegistrySource>,
    agent: Agent,
    memory_limit: usize,
    rules: SessionRules,
}

impl SessionManager {
    pub fn new(registry: Arc<RegistrySource>, agent: Agent, settings: &AgentSettings) -> Self {
        Self {
            registry,
            agent,
            memory_limit: settings.memory_limit,
            rules: SessionRules {
                exit_keywords: settings.exit_keywords.clone().into(),
                farewell: settings.farewell.as_str().into(),
            },
        }
    }

    pub fn registry(&self) -> &Arc<RegistrySource> {
        &self.registry
    }

    pub async fn open(&self) -> Session {
        let snapshot = self.registry.snapshot().await;
        let session = Session::new(
            snapshot,
            self.agent.clone(),
            self.memory_limit,
            self.rules.clone(),
        );
        info!(
            session_id = %session.id(),
            tools = session.registry().len(),
            "Session opened"
        );
        session
    }
}
