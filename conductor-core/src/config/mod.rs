//! Configuration loading and validation
//!
//! The TOML file is parsed into raw structures first and then validated into
//! [`AppConfig`]; environment variables referenced in server bindings are
//! expanded during validation.

pub mod app;
pub mod error;
pub mod loader;
pub mod model;
pub mod server;

pub use app::{AgentSettings, AppConfig, GatewaySettings, RegistryPolicy};
pub use error::ConfigError;
pub use loader::{ensure_env_loaded, load_config, parse_config};
pub use model::{ModelConfig, ProviderKind};
pub use server::{
    EventStreamParams, ServerAuth, ServerBinding, ServerTransport, StdioParams, TransportKind,
};
