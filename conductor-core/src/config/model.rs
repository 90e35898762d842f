use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an intelligent Assistant. You will execute tasks as instructed";

/// Which chat-completion dialect the model gateway speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" | "azure" | "groq" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(ConfigError::UnknownProvider {
                provider: other.to_string(),
            }),
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Ollama => "http://127.0.0.1:11434",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => f.write_str("openai"),
            ProviderKind::Ollama => f.write_str("ollama"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Override for the completion path appended to `endpoint`.
    pub api_path: Option<String>,
    pub system_prompt: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawModel {
    #[serde(default)]
    provider: Option<String>,
    name: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    api_key_env: Option<String>,
    #[serde(default)]
    api_path: Option<String>,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
}

impl TryFrom<RawModel> for ModelConfig {
    type Error = ConfigError;

    fn try_from(raw: RawModel) -> Result<Self, Self::Error> {
        let provider = match raw.provider.as_deref() {
            Some(value) => ProviderKind::parse(value)?,
            None => ProviderKind::OpenAi,
        };
        let model = raw
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingModel)?;
        let endpoint = raw
            .endpoint
            .map(|value| {
                shellexpand::env(&value)
                    .map(|expanded| expanded.into_owned())
                    .unwrap_or_else(|_| value.clone())
            })
            .unwrap_or_else(|| provider.default_endpoint().to_string());

        Ok(ModelConfig {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key_env: raw.api_key_env.filter(|name| !name.trim().is_empty()),
            api_path: raw.api_path,
            system_prompt: raw
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: raw.temperature,
        })
    }
}
