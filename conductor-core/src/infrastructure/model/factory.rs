//! Provider factory - creates clients from config

use super::clients::{OllamaClient, OpenAIClient};
use super::traits::ModelProvider;
use crate::config::{ModelConfig, ProviderKind};
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, env_var: Option<&str>) -> Option<String> {
    let raw = env_var.map(str::trim).filter(|name| !name.is_empty())?;
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &ModelConfig) -> Arc<dyn ModelProvider> {
        match config.provider {
            ProviderKind::Ollama => Arc::new(OllamaClient::from_config(config)),
            ProviderKind::OpenAi => Arc::new(OpenAIClient::from_config(config)),
        }
    }
}
