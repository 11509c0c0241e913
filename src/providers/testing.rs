//! Stub providers shared by unit tests

use super::traits::{Provider, ProviderSource, RegisteredProvider};
use crate::aliases::AliasStore;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Error,
    Panic,
}

/// Provider returning canned results and counting calls
pub struct StubProvider {
    prefix: Option<String>,
    results: Vec<SearchResult>,
    delay: Option<Duration>,
    search_failure: Failure,
    execute_failure: Failure,
    aliases: Option<AliasStore>,
    searches: AtomicUsize,
    executions: Mutex<Vec<SearchResult>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            prefix: None,
            results: Vec::new(),
            delay: None,
            search_failure: Failure::None,
            execute_failure: Failure::None,
            aliases: None,
            searches: AtomicUsize::new(0),
            executions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_search(mut self, failure: Failure) -> Self {
        self.search_failure = failure;
        self
    }

    pub fn failing_execute(mut self, failure: Failure) -> Self {
        self.execute_failure = failure;
        self
    }

    pub fn with_alias_file(mut self, path: &Path) -> Self {
        self.aliases = Some(AliasStore::load(path));
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<SearchResult> {
        self.executions.lock().clone()
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.search_failure {
            Failure::None => Ok(self.results.clone()),
            Failure::Error => Err(ProviderError::Parse("stub failure".to_string())),
            Failure::Panic => panic!("stub provider panicked"),
        }
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        match self.execute_failure {
            Failure::None => {
                self.executions.lock().push(item.clone());
                Ok(())
            }
            Failure::Error => Err(ProviderError::UnsupportedAction(item.action.clone())),
            Failure::Panic => panic!("stub provider panicked during execute"),
        }
    }

    fn aliases(&self) -> Option<&AliasStore> {
        self.aliases.as_ref()
    }
}

/// Source returning a replaceable fixed list
pub struct StaticSource {
    providers: Mutex<Vec<RegisteredProvider>>,
}

impl StaticSource {
    pub fn new(providers: Vec<RegisteredProvider>) -> Self {
        Self {
            providers: Mutex::new(providers),
        }
    }

    pub fn set(&self, providers: Vec<RegisteredProvider>) {
        *self.providers.lock() = providers;
    }
}

impl ProviderSource for StaticSource {
    fn discover(&self) -> Vec<RegisteredProvider> {
        self.providers.lock().clone()
    }
}
