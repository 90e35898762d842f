//! Agentic orchestration over MCP tool servers.
//!
//! A [`Conductor`] discovers tools across stdio and event-stream servers,
//! lets a language model pick one per round, executes it, and asks the model
//! whether the user's request is satisfied.

pub mod application;
mod bootstrap;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, dispatch, prompts, registry, session, tooling};
pub use bootstrap::Conductor;
pub use config::{AppConfig, ConfigError};
pub use infrastructure::{model, server};
