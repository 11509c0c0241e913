//! Query dispatch across the registered providers

use crate::metrics::Metrics;
use crate::providers::{ProviderRegistry, RegisteredProvider};
use crate::query::{toggle_suggestion, QueryKind, DEFAULT_SYNC_COMMAND};
use crate::results::SearchResult;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Fans a query out to every enabled provider and merges the results
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    metrics: Arc<Metrics>,
    /// Per-provider search timeout
    provider_timeout: Duration,
    /// Query that offers a provider sync instead of searching
    sync_command: String,
}

impl Dispatcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(registry: Arc<ProviderRegistry>, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            metrics,
            provider_timeout: Self::DEFAULT_TIMEOUT,
            sync_command: DEFAULT_SYNC_COMMAND.to_string(),
        }
    }

    /// Set per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Set the sync sentinel; empty disables it
    pub fn with_sync_command(mut self, command: impl Into<String>) -> Self {
        self.sync_command = command.into();
        self
    }

    /// Dispatch a raw query
    ///
    /// Results come back in registry order, each provider's own order
    /// preserved, stamped with the owning provider's registry name.
    pub async fn search(&self, raw: &str) -> Vec<SearchResult> {
        let query = match QueryKind::classify(raw, &self.sync_command) {
            QueryKind::Empty => return Vec::new(),
            QueryKind::Sync => return vec![SearchResult::sync_request()],
            QueryKind::Dispatch(query) => query,
        };

        // The list captured here is used for the whole dispatch
        let providers = self.registry.snapshot();
        let disabled = self.registry.disabled();
        self.metrics.inc_search();

        let contributions: Vec<BoxFuture<'_, Vec<SearchResult>>> = providers
            .iter()
            .map(|entry| {
                let is_disabled = disabled.contains(&entry.name);

                if let Some(toggle) =
                    toggle_suggestion(&entry.name, entry.prefix(), is_disabled, query)
                {
                    return futures::future::ready(vec![toggle]).boxed();
                }
                if is_disabled {
                    return futures::future::ready(Vec::new()).boxed();
                }
                self.search_provider(entry, query).boxed()
            })
            .collect();

        debug!(
            "Dispatching '{}' to {} providers",
            query,
            contributions.len()
        );

        join_all(contributions).await.into_iter().flatten().collect()
    }

    /// Search a single provider, containing errors, panics and timeouts
    async fn search_provider(&self, entry: &RegisteredProvider, query: &str) -> Vec<SearchResult> {
        let name = entry.name.as_str();
        let start = Instant::now();

        let search = AssertUnwindSafe(entry.provider.search(query)).catch_unwind();
        let outcome = timeout(self.provider_timeout, search).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(Ok(results))) => {
                self.metrics
                    .record_success(name, elapsed.as_millis() as u64);
                debug!(
                    "Provider {} returned {} results in {:?}",
                    name,
                    results.len(),
                    elapsed
                );
                results
                    .into_iter()
                    .map(|result| result.with_provider(name))
                    .collect()
            }
            Ok(Ok(Err(e))) => {
                warn!("Error in provider {}: {}", name, e);
                self.metrics.record_error(name);
                Vec::new()
            }
            Ok(Err(_)) => {
                error!("Provider {} panicked during search", name);
                self.metrics.record_error(name);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Timeout for provider {} after {:?}",
                    name, self.provider_timeout
                );
                self.metrics.record_timeout(name);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{Failure, StaticSource, StubProvider};
    use crate::providers::Provider;
    use crate::results::{ACTION_DISABLE, ACTION_ENABLE, ACTION_SYNC, SYSTEM_PROVIDER};
    use crate::storage::ProviderConfigStore;

    struct Fixture {
        _dir: tempfile::TempDir,
        registry: Arc<ProviderRegistry>,
        metrics: Arc<Metrics>,
        dispatcher: Dispatcher,
    }

    fn fixture(providers: Vec<(&str, Arc<StubProvider>)>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let entries = providers
            .into_iter()
            .map(|(name, p)| RegisteredProvider::new(name, p as Arc<dyn Provider>))
            .collect();
        let registry = Arc::new(ProviderRegistry::new(
            Arc::new(StaticSource::new(entries)),
            ProviderConfigStore::new(dir.path().join("providers.json")),
        ));
        registry.load();

        let metrics = Arc::new(Metrics::new());
        let dispatcher = Dispatcher::new(registry.clone(), metrics.clone())
            .with_timeout(Duration::from_millis(200));

        Fixture {
            _dir: dir,
            registry,
            metrics,
            dispatcher,
        }
    }

    fn results(titles: &[&str]) -> Vec<SearchResult> {
        titles
            .iter()
            .map(|t| SearchResult::new(*t, "open", *t))
            .collect()
    }

    #[tokio::test]
    async fn test_calculator_end_to_end() {
        let calc = Arc::new(
            StubProvider::new().with_results(vec![SearchResult::new("4", "copy", "4")]),
        );
        let f = fixture(vec![("calc", calc)]);

        let merged = f.dispatcher.search("2+2").await;
        assert_eq!(
            merged,
            vec![SearchResult::new("4", "copy", "4").with_provider("calc")]
        );
    }

    #[tokio::test]
    async fn test_merge_is_complete_and_ordered() {
        let slow = Arc::new(
            StubProvider::new()
                .with_results(results(&["a1", "a2"]))
                .with_delay(Duration::from_millis(50)),
        );
        let fast = Arc::new(StubProvider::new().with_results(results(&["b1", "b2", "b3"])));
        let empty = Arc::new(StubProvider::new());
        let f = fixture(vec![("slow", slow), ("fast", fast), ("empty", empty)]);

        let merged = f.dispatcher.search("x").await;
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b1", "b2", "b3"]);
        assert_eq!(f.metrics.get_total_searches(), 1);
    }

    #[tokio::test]
    async fn test_providers_search_concurrently() {
        let delayed = |title: &str| {
            Arc::new(
                StubProvider::new()
                    .with_results(results(&[title]))
                    .with_delay(Duration::from_millis(300)),
            )
        };
        let f = fixture(vec![
            ("one", delayed("1")),
            ("two", delayed("2")),
            ("three", delayed("3")),
        ]);
        let dispatcher = Dispatcher::new(f.registry.clone(), f.metrics.clone())
            .with_timeout(Duration::from_secs(2));

        let started = Instant::now();
        let merged = dispatcher.search("x").await;

        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "2", "3"]);
        assert!(started.elapsed() < Duration::from_millis(750));
    }

    #[tokio::test]
    async fn test_provider_field_is_overwritten() {
        let liar = Arc::new(StubProvider::new().with_results(vec![
            SearchResult::new("x", "open", "x").with_provider("someone-else"),
            SearchResult::new("y", "open", "y").with_provider(SYSTEM_PROVIDER),
        ]));
        let f = fixture(vec![("honest", liar)]);

        let merged = f.dispatcher.search("x").await;
        assert!(merged.iter().all(|r| r.provider == "honest"));
    }

    #[tokio::test]
    async fn test_failing_providers_are_isolated() {
        let before = Arc::new(StubProvider::new().with_results(results(&["a"])));
        let erroring = Arc::new(
            StubProvider::new()
                .with_results(results(&["never"]))
                .failing_search(Failure::Error),
        );
        let panicking = Arc::new(StubProvider::new().failing_search(Failure::Panic));
        let after = Arc::new(StubProvider::new().with_results(results(&["b"])));
        let f = fixture(vec![
            ("before", before),
            ("erroring", erroring),
            ("panicking", panicking.clone()),
            ("after", after),
        ]);

        let merged = f.dispatcher.search("x").await;
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(panicking.search_count(), 1);

        let stats = f.metrics.snapshot();
        assert_eq!(stats.providers["erroring"].errors, 1);
        assert_eq!(stats.providers["panicking"].errors, 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let stuck = Arc::new(
            StubProvider::new()
                .with_results(results(&["late"]))
                .with_delay(Duration::from_secs(5)),
        );
        let quick = Arc::new(StubProvider::new().with_results(results(&["quick"])));
        let f = fixture(vec![("stuck", stuck), ("quick", quick)]);

        let started = Instant::now();
        let merged = f.dispatcher.search("x").await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "quick");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(f.metrics.snapshot().providers["stuck"].timeouts, 1);
    }

    #[tokio::test]
    async fn test_empty_query_invokes_nobody() {
        let apps = Arc::new(StubProvider::new().with_prefix("apps").with_results(results(&["a"])));
        let f = fixture(vec![("apps", apps.clone())]);

        assert!(f.dispatcher.search("").await.is_empty());
        assert!(f.dispatcher.search("   ").await.is_empty());
        assert_eq!(apps.search_count(), 0);
        assert_eq!(f.metrics.get_total_searches(), 0);
    }

    #[tokio::test]
    async fn test_disable_toggle_replaces_search() {
        let apps = Arc::new(StubProvider::new().with_prefix("apps").with_results(results(&["a"])));
        let other = Arc::new(StubProvider::new().with_results(results(&["o"])));
        let f = fixture(vec![("apps", apps.clone()), ("other", other.clone())]);

        let merged = f.dispatcher.search("apps disable").await;

        let toggles: Vec<&SearchResult> = merged.iter().filter(|r| r.is_system()).collect();
        assert_eq!(toggles.len(), 1);
        assert_eq!(toggles[0].action, ACTION_DISABLE);
        assert_eq!(toggles[0].value, "apps");
        assert_eq!(apps.search_count(), 0);
        assert_eq!(other.search_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_provider_contributes_nothing_but_offers_enable() {
        let apps = Arc::new(StubProvider::new().with_prefix("apps").with_results(results(&["a"])));
        let f = fixture(vec![("apps", apps.clone())]);
        f.registry.set_disabled("apps", true).unwrap();

        assert!(f.dispatcher.search("firefox").await.is_empty());
        assert!(f.dispatcher.search("apps disable").await.is_empty());

        let merged = f.dispatcher.search("apps en").await;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].action, ACTION_ENABLE);
        assert_eq!(merged[0].provider, SYSTEM_PROVIDER);
        assert_eq!(apps.search_count(), 0);

        f.registry.set_disabled("apps", false).unwrap();
        assert_eq!(f.dispatcher.search("firefox").await.len(), 1);
        assert_eq!(apps.search_count(), 1);
    }

    #[tokio::test]
    async fn test_sync_sentinel_short_circuits() {
        let apps = Arc::new(StubProvider::new().with_results(results(&["a"])));
        let f = fixture(vec![("apps", apps.clone())]);

        let merged = f.dispatcher.search("sync plugins").await;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].action, ACTION_SYNC);
        assert!(merged[0].is_system());
        assert_eq!(apps.search_count(), 0);

        let custom = Dispatcher::new(f.registry.clone(), f.metrics.clone()).with_sync_command("/sync");
        assert_eq!(custom.search("sync plugins").await[0].title, "a");
        assert_eq!(custom.search("/sync").await[0].action, ACTION_SYNC);
    }

    #[tokio::test]
    async fn test_dispatch_uses_captured_list() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(StaticSource::new(vec![]));
        let registry = Arc::new(ProviderRegistry::new(
            source.clone(),
            ProviderConfigStore::new(dir.path().join("providers.json")),
        ));
        let dispatcher = Dispatcher::new(registry.clone(), Arc::new(Metrics::new()));
        registry.load();
        assert!(dispatcher.search("x").await.is_empty());

        source.set(vec![RegisteredProvider::new(
            "late",
            Arc::new(StubProvider::new().with_results(results(&["l"]))),
        )]);
        registry.load();
        assert_eq!(dispatcher.search("x").await[0].provider, "late");
    }
}
