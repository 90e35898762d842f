use super::tool_registry::ToolRegistry;
use crate::application::tooling::ToolServerInterface;
use crate::config::{RegistryPolicy, ServerBinding};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info};

/// Hands registry snapshots to sessions according to the configured policy.
pub struct RegistrySource {
    policy: RegistryPolicy,
    bindings: Arc<[ServerBinding]>,
    bridge: Arc<dyn ToolServerInterface>,
    latest: RwLock<Arc<ToolRegistry>>,
    writer: AsyncMutex<()>,
}

impl RegistrySource {
    /// Runs an initial discovery so the inventory is available immediately.
    pub async fn new(
        policy: RegistryPolicy,
        bindings: Vec<ServerBinding>,
        bridge: Arc<dyn ToolServerInterface>,
    ) -> Self {
        let bindings: Arc<[ServerBinding]> = bindings.into();
        let initial = ToolRegistry::discover(&bindings, bridge.as_ref()).await;
        Self {
            policy,
            bindings,
            bridge,
            latest: RwLock::new(Arc::new(initial)),
            writer: AsyncMutex::new(()),
        }
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn bridge(&self) -> Arc<dyn ToolServerInterface> {
        Arc::clone(&self.bridge)
    }

    /// Registry for a session that is opening now.
    pub async fn snapshot(&self) -> Arc<ToolRegistry> {
        match self.policy {
            RegistryPolicy::Shared => self.current().await,
            RegistryPolicy::PerSession => {
                debug!("Rediscovering tools for new session");
                self.refresh().await
            }
        }
    }

    /// Most recently built registry.
    pub async fn current(&self) -> Arc<ToolRegistry> {
        Arc::clone(&*self.latest.read().await)
    }

    /// Rediscover and publish a new snapshot. Concurrent callers are
    /// serialised; sessions holding the old snapshot keep it.
    pub async fn refresh(&self) -> Arc<ToolRegistry> {
        let _guard = self.writer.lock().await;
        let rebuilt = Arc::new(ToolRegistry::discover(&self.bindings, self.bridge.as_ref()).await);
        *self.latest.write().await = Arc::clone(&rebuilt);
        info!(tools = rebuilt.len(), "Tool registry refreshed");
        rebuilt
    }
}
