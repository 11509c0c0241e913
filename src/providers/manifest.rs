//! Provider manifests
//!
//! Each file in the providers directory declares one provider instance. The
//! file stem is the provider's registry name.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extensions recognized as provider manifests
pub const MANIFEST_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Default cap on results returned per provider
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Provider manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderManifest {
    /// Built-in provider kind to instantiate
    pub kind: String,
    /// Toggle namespace; overrides the kind's default when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Maximum results per query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Lifetime of cached enumerations, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
    /// Directories scanned for `.desktop` files (apps)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub app_dirs: Vec<PathBuf>,
    /// Directories searched for icons (apps)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icon_dirs: Vec<PathBuf>,
    /// Directories whose children are matched (files)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_dirs: Vec<PathBuf>,
    /// Minimum query length before searching (files)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_query_len: Option<usize>,
    /// Executable to invoke (flatpak)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Shell command producing JSON results (script)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_command: Option<String>,
    /// Shell command performing the chosen action (script)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_command: Option<String>,
}

impl ProviderManifest {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    /// The manifest prefix, falling back to `default`; empty disables toggles
    pub fn prefix_or(&self, default: Option<&str>) -> Option<String> {
        match self.prefix.as_deref() {
            Some("") => None,
            Some(prefix) => Some(prefix.to_string()),
            None => default.map(str::to_string),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}
