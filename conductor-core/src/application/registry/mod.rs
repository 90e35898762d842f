//! Aggregated tool catalog and the policy deciding when it is rebuilt.

mod source;
mod tool_registry;
pub mod types;

pub use source::RegistrySource;
pub use tool_registry::ToolRegistry;
pub use types::{DiscoveredServer, DiscoveryError, RegistryEntry, ShadowedTool};
