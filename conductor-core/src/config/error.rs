use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required section [model] in configuration")]
    MissingModel,

    #[error("unknown model provider '{provider}' (expected 'openai' or 'ollama')")]
    UnknownProvider { provider: String },

    #[error("invalid server binding '{server}': {reason}")]
    InvalidServer { server: String, reason: String },

    #[error("server binding '{server}' is declared more than once")]
    DuplicateServer { server: String },

    #[error("invalid gateway bind address '{value}'")]
    InvalidBind { value: String },

    #[error("agent.{field} must be greater than zero")]
    InvalidLimit { field: &'static str },
}
