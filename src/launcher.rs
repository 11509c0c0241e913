//! The launcher facade the presentation client talks to

use crate::aliases::{read_alias_map, write_alias_map, AliasMap};
use crate::config::Settings;
use crate::error::{LoupeError, LoupeResult};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::network::HttpClient;
use crate::providers::{ProviderInfo, ProviderLoader, ProviderRegistry};
use crate::results::SearchResult;
use crate::search::{Dispatcher, ExecutionRouter};
use crate::storage::ProviderConfigStore;
use crate::sync::{HttpDistributor, PluginSync};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Owns the registry, dispatcher and router
pub struct Launcher {
    registry: Arc<ProviderRegistry>,
    dispatcher: Dispatcher,
    router: ExecutionRouter,
    metrics: Arc<Metrics>,
    sync: Option<Arc<PluginSync>>,
    aliases_path: PathBuf,
}

impl Launcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        sync: Option<Arc<PluginSync>>,
        aliases_path: impl Into<PathBuf>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            dispatcher: Dispatcher::new(registry.clone(), metrics.clone()),
            router: ExecutionRouter::new(registry.clone(), sync.clone()),
            registry,
            metrics,
            sync,
            aliases_path: aliases_path.into(),
        }
    }

    /// Replace the dispatcher's timeout and sync sentinel
    pub fn with_dispatch_settings(mut self, settings: &Settings) -> Result<Self> {
        self.dispatcher = Dispatcher::new(self.registry.clone(), self.metrics.clone())
            .with_timeout(settings.provider_timeout()?)
            .with_sync_command(settings.search.sync_command.clone());
        Ok(self)
    }

    /// Build a launcher over the providers directory named in `settings`
    ///
    /// The registry starts empty; see [`start`](Self::start).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let providers_dir = settings.providers_dir();
        let aliases_path = settings.aliases_path();

        let loader = Arc::new(ProviderLoader::new(&providers_dir, &aliases_path));
        let registry = Arc::new(ProviderRegistry::new(
            loader,
            ProviderConfigStore::new(settings.provider_config_path()),
        ));

        let sync = match settings.sync.index_url.as_deref() {
            Some(index_url) => {
                let client = HttpClient::with_settings(&settings.sync)?;
                let distributor = HttpDistributor::new(client, index_url)?;
                Some(Arc::new(PluginSync::new(Arc::new(distributor), &providers_dir)))
            }
            None => None,
        };

        Self::new(registry, sync, aliases_path).with_dispatch_settings(settings)
    }

    /// Build, bootstrap the providers directory and load the registry
    ///
    /// An empty providers directory is synced first (when enabled) and then
    /// filled with the built-in defaults if it is still empty.
    pub async fn start(settings: &Settings) -> Result<Self> {
        let launcher = Self::from_settings(settings)?;
        let loader = ProviderLoader::new(settings.providers_dir(), settings.aliases_path());

        if !loader.has_manifests() && settings.sync.sync_on_empty && launcher.sync.is_some() {
            info!("Providers directory is empty, syncing");
            if let Err(e) = launcher.sync_now().await {
                warn!("Startup sync failed: {}", e);
            }
        }

        if let Err(e) = loader.install_defaults() {
            error!("Failed to install default providers: {}", e);
        }

        let loaded = launcher.reload().await;
        info!("Loaded {} providers", loaded);
        Ok(launcher)
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn aliases_path(&self) -> &Path {
        &self.aliases_path
    }

    /// Merged results for a raw query
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.dispatcher.search(query).await
    }

    /// Run a chosen result; never fails from the caller's point of view
    pub fn execute(&self, item: &SearchResult) {
        self.router.execute(item)
    }

    /// The persisted alias map, empty when unreadable
    pub async fn get_alias_map(&self) -> AliasMap {
        let path = self.aliases_path.clone();
        let read = tokio::task::spawn_blocking(move || read_alias_map(&path))
            .await
            .map_err(|e| LoupeError::persistence(&self.aliases_path, e));

        read.and_then(|result| result).unwrap_or_else(|e| {
            error!("Failed to read aliases: {}", e);
            AliasMap::new()
        })
    }

    /// Persist `aliases` and broadcast a reload; `false` when the write failed
    ///
    /// The write and every provider's reload run on the blocking pool.
    pub async fn save_alias_map(&self, aliases: &AliasMap) -> bool {
        let path = self.aliases_path.clone();
        let aliases = aliases.clone();
        let registry = self.registry.clone();
        let saved = tokio::task::spawn_blocking(move || {
            write_alias_map(&path, &aliases)?;
            registry.notify_alias_reload();
            Ok::<_, LoupeError>(())
        })
        .await
        .map_err(|e| LoupeError::persistence(&self.aliases_path, e));

        match saved.and_then(|result| result) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save aliases: {}", e);
                false
            }
        }
    }

    /// Re-discover providers
    pub async fn reload(&self) -> usize {
        self.registry.load_async().await
    }

    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.registry.list()
    }

    pub fn stats(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Sync providers from the distributor and reload, waiting for the result
    pub async fn sync_now(&self) -> LoupeResult<usize> {
        match &self.sync {
            Some(sync) => sync.sync_and_reload(&self.registry).await,
            None => Err(LoupeError::Config("no plugin index configured".to_string())),
        }
    }
}
