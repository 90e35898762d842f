use crate::application::agent::{Agent, AgentOptions};
use crate::application::dispatch::Dispatcher;
use crate::application::registry::RegistrySource;
use crate::application::session::SessionManager;
use crate::application::tooling::{ServerManager, ToolServerInterface};
use crate::config::{AppConfig, GatewaySettings};
use crate::infrastructure::model::{ModelGateway, ModelProvider, ProviderFactory};
use crate::infrastructure::server::{self, ServerError, ServerState};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Fully wired orchestration stack built from one configuration value.
pub struct Conductor {
    sessions: Arc<SessionManager>,
    gateway: GatewaySettings,
}

impl Conductor {
    /// Production wiring: configured model provider and live MCP servers.
    pub async fn from_config(config: &AppConfig) -> Self {
        let provider = ProviderFactory::create(&config.model);
        let bridge: Arc<dyn ToolServerInterface> = Arc::new(ServerManager::new());
        Self::assemble(config, provider, bridge).await
    }

    pub async fn assemble(
        config: &AppConfig,
        provider: Arc<dyn ModelProvider>,
        bridge: Arc<dyn ToolServerInterface>,
    ) -> Self {
        info!(
            servers = config.servers.len(),
            policy = ?config.agent.registry,
            "Assembling conductor"
        );
        let registry = Arc::new(
            RegistrySource::new(config.agent.registry, config.servers.clone(), bridge).await,
        );
        let agent = Agent::new(
            ModelGateway::from_config(provider, &config.model),
            Dispatcher::new(registry.bridge()),
            AgentOptions {
                max_turns: config.agent.max_turns,
            },
        );
        let sessions = Arc::new(SessionManager::new(registry, agent, &config.agent));
        Self {
            sessions,
            gateway: config.gateway.clone(),
        }
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(ServerState::new(self.sessions()));
        server::router(state, &self.gateway.allowed_origins)
    }

    pub async fn serve(&self, bind: Option<SocketAddr>) -> Result<(), ServerError> {
        let addr = bind.unwrap_or(self.gateway.bind);
        let state = Arc::new(ServerState::new(self.sessions()));
        server::serve(state, addr, &self.gateway.allowed_origins).await
    }
}
