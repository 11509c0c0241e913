//! Error types for Loupe
//!
//! Failures are contained at the smallest boundary that can absorb them: a
//! single provider, a single persistence operation, a single sync attempt.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the registry, persistence layer and plugin sync
#[derive(Debug, Error)]
pub enum LoupeError {
    /// A provider manifest could not be turned into a live provider
    #[error("failed to load provider '{name}': {reason}")]
    ProviderLoad { name: String, reason: String },

    /// Reading or writing a persisted document failed
    #[error("persistence error for {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    /// Remote provider sync failed
    #[error("plugin distributor error: {0}")]
    Distributor(String),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LoupeError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn provider_load(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProviderLoad {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors a provider reports from `search` or `execute`
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A subprocess could not be spawned or exited unsuccessfully
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// The provider does not know how to handle this action tag
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    /// Provider output could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// No async runtime is available to host a detached task
    #[error("no async runtime available: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub(crate) fn command(command: impl Into<String>, message: impl ToString) -> Self {
        Self::Command {
            command: command.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for Loupe operations
pub type LoupeResult<T> = Result<T, LoupeError>;
