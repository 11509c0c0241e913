//! Installed Flatpak applications

use super::icons::{default_flatpak_icon_roots, find_flatpak_icon};
use super::manifest::{ProviderManifest, DEFAULT_MAX_RESULTS};
use super::process::spawn_detached;
use super::traits::Provider;
use crate::aliases::{matches_with_aliases, AliasStore};
use crate::cache::EnumerationCache;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const ACTION_RUN: &str = "run-flatpak";
const FALLBACK_ICON: &str = "📦";

/// A row of `flatpak list` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatpakApp {
    pub name: String,
    pub app_id: String,
    pub description: String,
}

/// Parse tab-separated `name, application, description` rows
pub fn parse_flatpak_list(output: &str) -> Vec<FlatpakApp> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut columns = line.split('\t');
            let name = columns.next()?.trim();
            let app_id = columns.next()?.trim();
            let description = columns.next().unwrap_or("").trim();

            Some(FlatpakApp {
                name: name.to_string(),
                app_id: app_id.to_string(),
                description: format!("Flatpak: {}", description),
            })
        })
        .collect()
}

/// Provider for Flatpak applications
pub struct FlatpakProvider {
    binary: String,
    icon_roots: Arc<Vec<PathBuf>>,
    prefix: Option<String>,
    max_results: usize,
    cache: EnumerationCache<(FlatpakApp, String)>,
    aliases: AliasStore,
}

impl FlatpakProvider {
    pub const DEFAULT_PREFIX: &'static str = "flatpak";
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(aliases: AliasStore) -> Self {
        Self::from_manifest(&ProviderManifest::of_kind("flatpak"), aliases)
    }

    pub fn from_manifest(manifest: &ProviderManifest, aliases: AliasStore) -> Self {
        let icon_roots = if manifest.icon_dirs.is_empty() {
            default_flatpak_icon_roots()
        } else {
            manifest.icon_dirs.clone()
        };
        let ttl = manifest
            .cache_ttl
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_TTL);

        Self {
            binary: manifest
                .binary
                .clone()
                .unwrap_or_else(|| "flatpak".to_string()),
            icon_roots: Arc::new(icon_roots),
            prefix: manifest.prefix_or(Some(Self::DEFAULT_PREFIX)),
            max_results: manifest.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            cache: EnumerationCache::new(ttl),
            aliases,
        }
    }

    /// Installed apps paired with their resolved icon
    async fn apps(&self) -> Arc<Vec<(FlatpakApp, String)>> {
        self.cache
            .get_or_load(|| async {
                match self.list_installed().await {
                    Ok(apps) => {
                        let roots = self.icon_roots.clone();
                        apps.into_iter()
                            .map(|app| {
                                let icon = find_flatpak_icon(&app.app_id, &roots, FALLBACK_ICON);
                                (app, icon)
                            })
                            .collect()
                    }
                    Err(e) => {
                        warn!("Error listing flatpaks: {}", e);
                        Vec::new()
                    }
                }
            })
            .await
    }

    async fn list_installed(&self) -> Result<Vec<FlatpakApp>, ProviderError> {
        let output = Command::new(&self.binary)
            .args(["list", "--app", "--columns=name,application,description"])
            .output()
            .await
            .map_err(|e| ProviderError::command(&self.binary, e))?;

        if !output.status.success() {
            return Err(ProviderError::command(
                &self.binary,
                format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let apps = parse_flatpak_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Found {} flatpak applications", apps.len());
        Ok(apps)
    }
}

fn matches(app: &FlatpakApp, query: &str, targets: &[String]) -> bool {
    matches_with_aliases(&app.name, query, targets)
        || app.description.to_lowercase().contains(query)
}

#[async_trait]
impl Provider for FlatpakProvider {
    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let apps = self.apps().await;
        let q = query.to_lowercase();
        let targets = self.aliases.matching_targets(&q);

        Ok(apps
            .iter()
            .filter(|(app, _)| matches(app, &q, &targets))
            .take(self.max_results)
            .map(|(app, icon)| {
                SearchResult::new(&app.name, ACTION_RUN, &app.app_id)
                    .with_description(&app.description)
                    .with_icon(icon)
            })
            .collect())
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        match item.action.as_str() {
            ACTION_RUN => {
                debug!("Running Flatpak: {}", item.value);
                spawn_detached(&self.binary, ["run", item.value.as_str()], &[])
            }
            other => Err(ProviderError::UnsupportedAction(other.to_string())),
        }
    }

    fn aliases(&self) -> Option<&AliasStore> {
        Some(&self.aliases)
    }
}
