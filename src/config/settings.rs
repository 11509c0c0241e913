//! Settings structures for Loupe configuration

use crate::query::DEFAULT_SYNC_COMMAND;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub paths: PathSettings,
    pub search: SearchSettings,
    pub sync: SyncSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge with environment variables (LOUPE_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LOUPE_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("LOUPE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("LOUPE_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("LOUPE_DATA_DIR") {
            self.paths.data_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = var("LOUPE_PLUGIN_INDEX_URL") {
            self.sync.index_url = Some(val).filter(|url| !url.is_empty());
        }
    }

    /// Directory holding providers and state documents
    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("loupe")
        })
    }

    pub fn providers_dir(&self) -> PathBuf {
        self.data_dir().join(&self.paths.providers_dir)
    }

    pub fn aliases_path(&self) -> PathBuf {
        self.data_dir().join(&self.paths.aliases_file)
    }

    pub fn provider_config_path(&self) -> PathBuf {
        self.data_dir().join(&self.paths.provider_config_file)
    }

    pub fn provider_timeout(&self) -> Result<Duration> {
        seconds("search.provider_timeout", self.search.provider_timeout)
    }
}

/// Convert a seconds setting, rejecting negative and non-finite values
fn seconds(field: &str, value: f64) -> Result<Duration> {
    if !value.is_finite() {
        return Err(anyhow!("{} must be a finite number of seconds, got {}", field, value));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow!("{} must be a non-negative number of seconds, got {}", field, value))
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 7878,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// File locations
///
/// Relative entries are resolved against the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Defaults to `<XDG data dir>/loupe`
    pub data_dir: Option<PathBuf>,
    pub providers_dir: PathBuf,
    pub aliases_file: PathBuf,
    pub provider_config_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            providers_dir: PathBuf::from("providers"),
            aliases_file: PathBuf::from("aliases.json"),
            provider_config_file: PathBuf::from("providers.json"),
        }
    }
}

/// Dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Per-provider search timeout in seconds
    pub provider_timeout: f64,
    /// Query answered with a sync offer; empty disables it
    pub sync_command: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider_timeout: 3.0,
            sync_command: DEFAULT_SYNC_COMMAND.to_string(),
        }
    }
}

/// Remote provider sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// JSON index of remote provider manifests; sync is off when unset
    pub index_url: Option<String>,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Proxy for all requests
    pub proxy: Option<String>,
    /// Sync at startup when the providers directory holds no manifests
    pub sync_on_empty: bool,
}

impl SyncSettings {
    pub fn request_timeout(&self) -> Result<Duration> {
        seconds("sync.request_timeout", self.request_timeout)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            index_url: None,
            request_timeout: 10.0,
            proxy: None,
            sync_on_empty: true,
        }
    }
}
