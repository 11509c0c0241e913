//! Provider traits and types

use crate::aliases::AliasStore;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Main trait that every search provider implements
///
/// A well-behaved provider catches its own internal failures and returns an
/// empty list from `search`. Returning `Err` (or panicking) is tolerated by
/// the dispatcher, which treats it as an empty contribution.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Namespace for `"<prefix> disable"` / `"<prefix> enable"` toggles
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Produce results for a non-empty query
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError>;

    /// Perform the side effect for a result this provider produced
    ///
    /// Spawned subprocesses are detached; this never waits on them.
    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError>;

    /// Alias store this provider widens its matching with, if any
    ///
    /// Providers exposing a store take part in alias reload broadcasts.
    fn aliases(&self) -> Option<&AliasStore> {
        None
    }
}

/// A live provider together with its registry name
#[derive(Clone)]
pub struct RegisteredProvider {
    pub name: String,
    pub provider: Arc<dyn Provider>,
}

impl RegisteredProvider {
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.provider.prefix()
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("prefix", &self.prefix())
            .finish()
    }
}

/// Discovers and instantiates the full provider set
///
/// The registry calls `discover` on every load and replaces its live list
/// with the output.
pub trait ProviderSource: Send + Sync {
    fn discover(&self) -> Vec<RegisteredProvider>;
}

/// Provider information for listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub prefix: Option<String>,
    pub enabled: bool,
}
