use super::types::{DiscoveredServer, DiscoveryError, RegistryEntry, ShadowedTool};
use crate::application::tooling::{ServerCatalog, ToolInvokeError, ToolServerInterface};
use crate::config::ServerBinding;
use crate::domain::ToolDescriptor;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Aggregated tool catalog across every reachable binding.
///
/// Immutable once built. When two bindings expose the same tool name the
/// binding listed first in configuration owns it; the later one is recorded in
/// [`ToolRegistry::shadowed`].
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
    servers: Vec<DiscoveredServer>,
    failures: Vec<DiscoveryError>,
    shadowed: Vec<ShadowedTool>,
    discovered_at: DateTime<Utc>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            servers: Vec::new(),
            failures: Vec::new(),
            shadowed: Vec::new(),
            discovered_at: Utc::now(),
        }
    }

    /// Query every binding concurrently and merge the answers in
    /// configuration order. A failing binding is logged and left out.
    pub async fn discover(bindings: &[ServerBinding], bridge: &dyn ToolServerInterface) -> Self {
        let lookups = bindings.iter().map(|binding| bridge.list_tools(binding));
        let results = join_all(lookups).await;
        Self::from_results(bindings.iter().cloned().zip(results))
    }

    /// Build from per-binding discovery results, in order.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (ServerBinding, Result<ServerCatalog, ToolInvokeError>)>,
    {
        let mut registry = Self::empty();
        for (binding, result) in results {
            match result {
                Ok(catalog) => registry.absorb(Arc::new(binding), catalog),
                Err(err) => {
                    warn!(server = %binding.name, %err, "Tool discovery failed; excluding server");
                    registry.failures.push(DiscoveryError {
                        server: binding.name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            tools = registry.entries.len(),
            servers = registry.servers.len(),
            failed = registry.failures.len(),
            shadowed = registry.shadowed.len(),
            "Tool registry built"
        );
        registry
    }

    fn absorb(&mut self, binding: Arc<ServerBinding>, catalog: ServerCatalog) {
        let mut added = 0;
        for descriptor in catalog.tools {
            if let Some(&existing) = self.index.get(&descriptor.name) {
                let kept_server = self.entries[existing].binding.name.clone();
                warn!(
                    tool = %descriptor.name,
                    kept = %kept_server,
                    shadowed = %binding.name,
                    "Duplicate tool name; keeping the first binding"
                );
                self.shadowed.push(ShadowedTool {
                    tool: descriptor.name,
                    kept_server,
                    shadowed_server: binding.name.clone(),
                });
                continue;
            }
            self.index.insert(descriptor.name.clone(), self.entries.len());
            self.entries.push(RegistryEntry {
                binding: Arc::clone(&binding),
                identity: catalog.identity.clone(),
                descriptor,
            });
            added += 1;
        }

        self.servers.push(DiscoveredServer {
            name: binding.name.clone(),
            identity: catalog.identity,
            instructions: catalog.instructions,
            tool_count: added,
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Descriptors in registration order.
    pub fn catalog(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn servers(&self) -> &[DiscoveredServer] {
        &self.servers
    }

    pub fn failures(&self) -> &[DiscoveryError] {
        &self.failures
    }

    pub fn shadowed(&self) -> &[ShadowedTool] {
        &self.shadowed
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
