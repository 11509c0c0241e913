//! Provider-local caches
//!
//! Providers that enumerate something expensive (installed applications,
//! Flatpak packages) keep the enumeration in a TTL cache owned by the
//! provider instance. Nothing is shared across providers.

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// TTL cache holding a single enumerated list
pub struct EnumerationCache<T> {
    cache: Cache<(), Arc<Vec<T>>>,
}

impl<T> EnumerationCache<T>
where
    T: Send + Sync + 'static,
{
    /// Create a cache whose contents expire `ttl` after being stored
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).max_capacity(1).build();

        Self { cache }
    }

    /// Get the cached list
    pub async fn get(&self) -> Option<Arc<Vec<T>>> {
        self.cache.get(&()).await
    }

    /// Return the cached list, or run `load` and cache its output
    ///
    /// Empty enumerations are returned but not cached, so the next call
    /// retries the scan.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Arc<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<T>>,
    {
        if let Some(entries) = self.get().await {
            return entries;
        }

        let entries = Arc::new(load().await);
        if !entries.is_empty() {
            self.cache.insert((), entries.clone()).await;
        }
        entries
    }

    /// Drop the cached list
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
