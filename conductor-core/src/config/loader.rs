use super::app::{AgentSettings, AppConfig, GatewaySettings, RawAgent, RawGateway};
use super::error::ConfigError;
use super::model::{ModelConfig, RawModel};
use super::server::{RawServer, ServerBinding};
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<RawModel>,
    #[serde(default)]
    pub agent: RawAgent,
    #[serde(default)]
    pub gateway: RawGateway,
    #[serde(default)]
    pub servers: Vec<RawServer>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

/// Parse configuration from an in-memory TOML document.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: "<inline>".into(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading conductor configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let config = validate_and_build(parsed)?;
    info!(
        path = %path.display(),
        servers = config.servers.len(),
        provider = %config.model.provider,
        model = %config.model.model,
        "Configuration loaded"
    );
    Ok(config)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = ModelConfig::try_from(parsed.model.ok_or(ConfigError::MissingModel)?)?;
    let agent = build_agent(parsed.agent)?;
    let gateway = build_gateway(parsed.gateway)?;

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(parsed.servers.len());
    for raw in parsed.servers {
        let mut binding = ServerBinding::try_from(raw)?;
        if !seen.insert(binding.name.clone()) {
            return Err(ConfigError::DuplicateServer {
                server: binding.name,
            });
        }
        if let Some(cap) = agent.tool_timeout {
            binding.timeout = binding.timeout.min(cap);
        }
        servers.push(binding);
    }

    Ok(AppConfig {
        model,
        agent,
        gateway,
        servers,
    })
}

fn build_agent(raw: RawAgent) -> Result<AgentSettings, ConfigError> {
    let defaults = AgentSettings::default();
    let max_turns = raw.max_turns.unwrap_or(defaults.max_turns);
    if max_turns == 0 {
        return Err(ConfigError::InvalidLimit { field: "max_turns" });
    }
    let memory_limit = raw.memory_limit.unwrap_or(defaults.memory_limit);
    if memory_limit == 0 {
        return Err(ConfigError::InvalidLimit {
            field: "memory_limit",
        });
    }
    let tool_timeout = match raw.tool_timeout_secs {
        Some(0) => {
            return Err(ConfigError::InvalidLimit {
                field: "tool_timeout_secs",
            });
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };
    let exit_keywords = raw
        .exit_keywords
        .map(|keywords| {
            keywords
                .into_iter()
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|keywords| !keywords.is_empty())
        .unwrap_or(defaults.exit_keywords);

    Ok(AgentSettings {
        max_turns,
        memory_limit,
        registry: raw.registry.unwrap_or(defaults.registry),
        exit_keywords,
        farewell: raw.farewell.unwrap_or(defaults.farewell),
        tool_timeout,
    })
}

fn build_gateway(raw: RawGateway) -> Result<GatewaySettings, ConfigError> {
    let defaults = GatewaySettings::default();
    let bind = match raw.bind {
        Some(value) => value
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind { value })?,
        None => defaults.bind,
    };
    Ok(GatewaySettings {
        bind,
        allowed_origins: raw.allowed_origins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::app::RegistryPolicy;
    use crate::config::model::ProviderKind;
    use crate::config::server::TransportKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[model]
provider = "openai"
name = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"

[agent]
max_turns = 3
registry = "per_session"
tool_timeout_secs = 10

[gateway]
bind = "127.0.0.1:8200"
allowed_origins = ["http://localhost:8501"]

[[servers]]
name = "bmi"
command = "python"
args = ["bmi_server.py"]
timeout_secs = 60

[[servers]]
name = "weather-time"
transport = "sse"
url = "http://localhost:8100/sse"
"#;

    #[test]
    fn loads_full_configuration_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write config");

        let config = load_config(Some(file.path())).expect("config loads");

        assert_eq!(config.model.provider, ProviderKind::OpenAi);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.endpoint, "https://api.openai.com");
        assert_eq!(config.agent.max_turns, 3);
        assert_eq!(config.agent.registry, RegistryPolicy::PerSession);
        assert_eq!(config.gateway.bind.port(), 8200);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].name, "bmi");
        assert_eq!(config.servers[0].timeout, Duration::from_secs(10));
        assert_eq!(config.servers[1].kind(), TransportKind::EventStream);
    }

    #[test]
    fn applies_defaults_when_optional_sections_are_absent() {
        let config = parse_config(
            r#"
[model]
provider = "ollama"
name = "llama3"
"#,
        )
        .expect("config parses");

        assert_eq!(config.model.endpoint, "http://127.0.0.1:11434");
        assert_eq!(config.agent.max_turns, 5);
        assert_eq!(config.agent.memory_limit, 50);
        assert_eq!(config.agent.exit_keywords, vec!["exit", "bye", "close"]);
        assert_eq!(config.agent.farewell, "See you later!");
        assert!(config.servers.is_empty());
    }

    #[test]
    fn model_settings_compare_with_fractional_temperature() {
        let source = r#"
[model]
provider = "ollama"
name = "llama3"
temperature = 0.2
"#;
        let first = parse_config(source).expect("config parses");
        let second = parse_config(source).expect("config parses");

        assert_eq!(first.model.temperature, Some(0.2));
        assert_eq!(first.model, second.model);
    }

    #[test]
    fn missing_model_section_is_rejected() {
        assert!(matches!(
            parse_config("[agent]\nmax_turns = 2\n"),
            Err(ConfigError::MissingModel)
        ));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_server_names_are_rejected() {
        let result = parse_config(
            r#"
[model]
name = "gpt-4o-mini"

[[servers]]
name = "tools"
command = "a"

[[servers]]
name = "tools"
command = "b"
"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateServer { .. })));
    }

    #[test]
    fn zero_turn_limit_is_rejected() {
        let result = parse_config(
            r#"
[model]
name = "gpt-4o-mini"

[agent]
max_turns = 0
"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidLimit { field: "max_turns" })
        ));
    }
}
