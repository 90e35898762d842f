//! Language-model access: provider clients and the prompt-to-text gateway.

pub mod clients;
pub mod factory;
pub mod gateway;
pub mod traits;
pub mod types;

pub use factory::{ProviderFactory, resolve_api_key};
pub use gateway::ModelGateway;
pub use traits::ModelProvider;
pub use types::{ChatMessage, MessageRole, ModelError, ModelRequest, ModelResponse};
