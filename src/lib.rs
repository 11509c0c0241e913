//! Loupe: a desktop quick-launcher engine
//!
//! Queries fan out to a registry of search providers (applications, Flatpak
//! packages, folders, a calculator, script plugins), their results are merged
//! in registry order, and a chosen result is routed back to its provider.

pub mod aliases;
pub mod cache;
pub mod config;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod query;
pub mod results;
pub mod search;
pub mod storage;
pub mod sync;
pub mod web;

pub use config::Settings;
pub use error::{LoupeError, LoupeResult, ProviderError};
pub use launcher::Launcher;
pub use providers::{Provider, ProviderRegistry};
pub use results::SearchResult;
pub use search::{Dispatcher, ExecutionRouter};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
