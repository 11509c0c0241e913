//! Metrics collection module
//!
//! Tracks provider response times, error rates and timeouts.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// Dispatcher metrics collector
pub struct Metrics {
    total_searches: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Increment the dispatched query count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    fn with_provider(&self, provider: &str, update: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self.providers.write();
        update(providers.entry(provider.to_string()).or_default());
    }

    /// Record a completed provider search and its response time
    pub fn record_success(&self, provider: &str, time_ms: u64) {
        self.with_provider(provider, |c| {
            c.searches += 1;
            c.successes += 1;
            if c.response_times.len() >= RESPONSE_WINDOW {
                c.response_times.pop_front();
            }
            c.response_times.push_back(time_ms);
        });
    }

    /// Record a provider search that failed or panicked
    pub fn record_error(&self, provider: &str) {
        self.with_provider(provider, |c| {
            c.searches += 1;
            c.errors += 1;
        });
    }

    /// Record a provider search that exceeded its timeout
    pub fn record_timeout(&self, provider: &str) {
        self.with_provider(provider, |c| {
            c.searches += 1;
            c.timeouts += 1;
        });
    }

    /// Average of the recent response times for a provider
    pub fn get_avg_response_time(&self, provider: &str) -> Option<u64> {
        self.providers
            .read()
            .get(provider)
            .and_then(|c| average(&c.response_times))
    }

    /// Share of searches that completed successfully, in percent
    pub fn get_reliability(&self, provider: &str) -> f64 {
        self.providers
            .read()
            .get(provider)
            .map(reliability)
            .unwrap_or(100.0)
    }

    /// Serializable view of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self
            .providers
            .read()
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    ProviderStats {
                        searches: c.searches,
                        successes: c.successes,
                        errors: c.errors,
                        timeouts: c.timeouts,
                        avg_response_time: average(&c.response_times),
                        reliability: reliability(c),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            total_searches: self.get_total_searches(),
            providers,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average(times: &VecDeque<u64>) -> Option<u64> {
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    if counters.searches == 0 {
        100.0
    } else {
        (counters.successes as f64 / counters.searches as f64) * 100.0
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub searches: u64,
    pub successes: u64,
    pub errors: u64,
    pub timeouts: u64,
    /// Milliseconds, over the most recent successful searches
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub providers: BTreeMap<String, ProviderStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_success("apps", 100);
        metrics.record_success("apps", 50);

        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(metrics.get_avg_response_time("apps"), Some(75));
        assert_eq!(metrics.get_reliability("apps"), 100.0);
        assert_eq!(metrics.get_reliability("unknown"), 100.0);
    }

    #[test]
    fn test_failures_lower_reliability() {
        let metrics = Metrics::new();
        metrics.record_success("files", 10);
        metrics.record_error("files");
        metrics.record_timeout("files");
        metrics.record_timeout("files");

        let snapshot = metrics.snapshot();
        let files = &snapshot.providers["files"];
        assert_eq!(files.searches, 4);
        assert_eq!(files.errors, 1);
        assert_eq!(files.timeouts, 2);
        assert_eq!(files.reliability, 25.0);
    }

    #[test]
    fn test_response_window_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_success("calc", 1000);
        }
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_success("calc", 10);
        }
        assert_eq!(metrics.get_avg_response_time("calc"), Some(10));
    }
}
