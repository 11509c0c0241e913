//! Provider configuration document (the disabled-provider set)

use super::{read_document, write_document};
use crate::error::LoupeResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persisted provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Names of providers the user has disabled
    pub disabled: BTreeSet<String>,
}

/// File-backed store for [`ProviderConfig`]
#[derive(Debug, Clone)]
pub struct ProviderConfigStore {
    path: PathBuf,
}

impl ProviderConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; unreadable content is logged and treated as empty
    pub fn load(&self) -> ProviderConfig {
        match read_document(&self.path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring provider config: {}", e);
                ProviderConfig::default()
            }
        }
    }

    pub fn save(&self, config: &ProviderConfig) -> LoupeResult<()> {
        write_document(&self.path, config)
    }
}
