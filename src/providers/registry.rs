//! Provider registry holding the live provider list and the disabled set

use super::traits::{ProviderInfo, ProviderSource, RegisteredProvider};
use crate::error::LoupeResult;
use crate::storage::{ProviderConfig, ProviderConfigStore};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Immutable view of the provider list captured at one point in time
pub type ProviderList = Arc<Vec<RegisteredProvider>>;

/// Registry of live providers
pub struct ProviderRegistry {
    source: Arc<dyn ProviderSource>,
    providers: RwLock<ProviderList>,
    config: RwLock<ProviderConfig>,
    store: ProviderConfigStore,
}

impl ProviderRegistry {
    /// Create a registry, reading the disabled set once from `store`
    ///
    /// The provider list starts empty; call [`load`](Self::load) to populate it.
    pub fn new(source: Arc<dyn ProviderSource>, store: ProviderConfigStore) -> Self {
        let config = store.load();
        if !config.disabled.is_empty() {
            info!("Disabled providers: {:?}", config.disabled);
        }

        Self {
            source,
            providers: RwLock::new(Arc::new(Vec::new())),
            config: RwLock::new(config),
            store,
        }
    }

    /// Re-discover every provider and swap the live list in one step
    ///
    /// Dispatches already holding the previous list keep using it.
    pub fn load(&self) -> usize {
        let providers = self.source.discover();
        let count = providers.len();
        *self.providers.write() = Arc::new(providers);
        info!("Loaded {} providers", count);
        count
    }

    /// [`load`](Self::load) on the blocking pool
    ///
    /// Discovery scans the providers directory and reads every manifest, so
    /// async callers go through here instead of blocking a runtime worker.
    pub async fn load_async(self: &Arc<Self>) -> usize {
        let registry = self.clone();
        match tokio::task::spawn_blocking(move || registry.load()).await {
            Ok(count) => count,
            Err(e) => {
                error!("Provider discovery task failed: {}", e);
                self.len()
            }
        }
    }

    /// The current provider list
    pub fn snapshot(&self) -> ProviderList {
        self.providers.read().clone()
    }

    /// Get a live provider by registry name
    pub fn get(&self, name: &str) -> Option<RegisteredProvider> {
        self.providers
            .read()
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    /// Registry names in iteration order
    pub fn names(&self) -> Vec<String> {
        self.providers.read().iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.config.read().disabled.contains(name)
    }

    /// Current disabled set
    pub fn disabled(&self) -> BTreeSet<String> {
        self.config.read().disabled.clone()
    }

    /// Enable or disable a provider and persist the change
    ///
    /// Names of providers that are not loaded are still recorded. When the
    /// write fails the change stays in effect for this session and the error
    /// is returned.
    pub fn set_disabled(&self, name: &str, disabled: bool) -> LoupeResult<()> {
        let config = {
            let mut config = self.config.write();
            let changed = if disabled {
                config.disabled.insert(name.to_string())
            } else {
                config.disabled.remove(name)
            };
            if !changed {
                debug!("Provider {} already {}", name, state_label(disabled));
            }
            config.clone()
        };

        info!("Provider {} {}", name, state_label(disabled));

        self.store.save(&config).map_err(|e| {
            error!("Failed to persist provider state: {}", e);
            e
        })
    }

    /// Ask every provider with an alias store to reload it
    ///
    /// Failures are logged per provider and never stop the broadcast.
    /// Returns the number of providers that reloaded successfully.
    pub fn notify_alias_reload(&self) -> usize {
        let mut reloaded = 0;

        for entry in self.snapshot().iter() {
            let Some(aliases) = entry.provider.aliases() else {
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| aliases.reload())) {
                Ok(Ok(())) => reloaded += 1,
                Ok(Err(e)) => warn!("Error reloading aliases in provider {}: {}", entry.name, e),
                Err(_) => error!("Provider {} panicked while reloading aliases", entry.name),
            }
        }

        debug!("Reloaded aliases in {} providers", reloaded);
        reloaded
    }

    /// Listing of providers with their toggle state
    pub fn list(&self) -> Vec<ProviderInfo> {
        let disabled = self.disabled();
        self.snapshot()
            .iter()
            .map(|p| ProviderInfo {
                name: p.name.clone(),
                prefix: p.prefix().map(str::to_string),
                enabled: !disabled.contains(&p.name),
            })
            .collect()
    }
}

fn state_label(disabled: bool) -> &'static str {
    if disabled {
        "disabled"
    } else {
        "enabled"
    }
}
