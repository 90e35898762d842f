use super::traits::ModelProvider;
use super::types::{ChatMessage, ModelError, ModelRequest};
use crate::config::ModelConfig;
use std::sync::Arc;
use tracing::debug;

/// Prompt-in, text-out adapter the agent loop talks to.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn ModelProvider>,
    model: String,
    system_prompt: String,
    temperature: Option<f32>,
}

impl ModelGateway {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: None,
        }
    }

    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            ..Self::new(provider, config.model.clone(), config.system_prompt.clone())
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ModelRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            temperature: self.temperature,
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");
        let response = self.provider.chat(request).await?;
        Ok(response.message.content)
    }
}
