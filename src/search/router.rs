//! Routing of chosen results to their owner

use crate::providers::ProviderRegistry;
use crate::results::{SearchResult, ACTION_DISABLE, ACTION_ENABLE, ACTION_SYNC};
use crate::sync::PluginSync;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Sends a chosen result back to the provider that produced it
///
/// System results are handled here: toggles go to the registry and sync
/// requests start a background sync followed by a reload.
pub struct ExecutionRouter {
    registry: Arc<ProviderRegistry>,
    sync: Option<Arc<PluginSync>>,
}

impl ExecutionRouter {
    pub fn new(registry: Arc<ProviderRegistry>, sync: Option<Arc<PluginSync>>) -> Self {
        Self { registry, sync }
    }

    /// Execute `item`; failures are logged and never returned
    pub fn execute(&self, item: &SearchResult) {
        if item.is_system() {
            self.execute_system(item);
            return;
        }

        let Some(entry) = self.registry.get(&item.provider) else {
            debug!(
                "Dropping execute for unknown provider '{}'",
                item.provider
            );
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| entry.provider.execute(item))) {
            Ok(Ok(())) => debug!("Executed '{}' in provider {}", item.title, entry.name),
            Ok(Err(e)) => warn!("Error executing item in provider {}: {}", entry.name, e),
            Err(_) => error!("Provider {} panicked during execute", entry.name),
        }
    }

    fn execute_system(&self, item: &SearchResult) {
        match item.action.as_str() {
            ACTION_DISABLE => {
                // Persistence failures are logged by the registry
                let _ = self.registry.set_disabled(&item.value, true);
            }
            ACTION_ENABLE => {
                let _ = self.registry.set_disabled(&item.value, false);
            }
            ACTION_SYNC => self.start_sync(),
            other => warn!("Unknown system action: {}", other),
        }
    }

    /// Run sync-and-reload in the background
    fn start_sync(&self) {
        let Some(sync) = self.sync.clone() else {
            warn!("Sync requested but no plugin index is configured");
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            error!("Sync requested outside of an async runtime");
            return;
        };

        let registry = self.registry.clone();
        handle.spawn(async move {
            info!("Syncing providers into {}", sync.dir().display());
            if let Ok(loaded) = sync.sync_and_reload(&registry).await {
                info!("Reloaded {} providers after sync", loaded);
            }
        });
    }
}
