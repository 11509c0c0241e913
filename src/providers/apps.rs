//! Installed applications from XDG `.desktop` entries

use super::icons::{default_icon_dirs, find_icon};
use super::manifest::{ProviderManifest, DEFAULT_MAX_RESULTS};
use super::process::spawn_shell;
use super::traits::Provider;
use crate::aliases::{matches_with_aliases, AliasStore};
use crate::cache::EnumerationCache;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const ACTION_EXEC: &str = "exec";
const FALLBACK_ICON: &str = "🚀";

/// Desktop entry field codes (`%u`, `%F`, ...) stripped from `Exec`
static FIELD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[a-zA-Z]").unwrap());

/// An application discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    /// Desktop file name without extension
    pub id: String,
    pub name: String,
    /// Launch command with field codes removed
    pub exec: String,
    /// Resolved icon path, or the fallback glyph
    pub icon: String,
}

/// The `[Desktop Entry]` fields this provider uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: String,
    pub icon: Option<String>,
}

/// Parse the main group of a desktop file
///
/// Returns `None` for entries without `Name`/`Exec` and for entries marked
/// `NoDisplay` or `Hidden`.
pub fn parse_desktop_entry(content: &str) -> Option<DesktopEntry> {
    let mut in_main_group = false;
    let mut name = None;
    let mut exec = None;
    let mut icon = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Name" if name.is_none() => name = Some(value.to_string()),
            "Exec" if exec.is_none() => exec = Some(value.to_string()),
            "Icon" if icon.is_none() => icon = Some(value.to_string()),
            "NoDisplay" | "Hidden" if is_true(value) => return None,
            _ => {}
        }
    }

    let exec = FIELD_CODE.replace_all(&exec?, "").trim().to_string();
    if exec.is_empty() {
        return None;
    }

    Some(DesktopEntry {
        name: name?,
        exec,
        icon,
    })
}

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Default application directories, user entries first
pub fn default_app_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(data) = dirs::data_local_dir() {
        dirs.push(data.join("applications"));
    }
    dirs.push(PathBuf::from("/usr/local/share/applications"));
    dirs.push(PathBuf::from("/usr/share/applications"));
    dirs
}

/// Read every `.desktop` file directly inside `app_dirs`
///
/// When two directories hold the same desktop id the first one wins.
pub fn scan_app_dirs(app_dirs: &[PathBuf], icon_dirs: &[PathBuf]) -> Vec<AppEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for dir in app_dirs.iter().filter(|d| d.is_dir()) {
        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Error reading app dir {}: {}", dir.display(), e);
                continue;
            }
        };

        for path in listing.filter_map(|e| e.ok()).map(|e| e.path()) {
            if path.extension().map_or(true, |ext| ext != "desktop") {
                continue;
            }
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if seen.contains(&id) {
                continue;
            }

            // Unreadable entries are skipped
            let Some(entry) = read_desktop_file(&path) else {
                continue;
            };

            seen.insert(id.clone());
            entries.push(AppEntry {
                id,
                icon: find_icon(entry.icon.as_deref(), icon_dirs, FALLBACK_ICON),
                name: entry.name,
                exec: entry.exec,
            });
        }
    }

    entries.sort_by_key(|e| e.name.to_lowercase());
    debug!("Indexed {} applications", entries.len());
    entries
}

fn read_desktop_file(path: &Path) -> Option<DesktopEntry> {
    let content = fs::read_to_string(path).ok()?;
    parse_desktop_entry(&content)
}

/// Provider for installed applications
pub struct AppsProvider {
    app_dirs: Arc<Vec<PathBuf>>,
    icon_dirs: Arc<Vec<PathBuf>>,
    prefix: Option<String>,
    max_results: usize,
    cache: EnumerationCache<AppEntry>,
    aliases: AliasStore,
}

impl AppsProvider {
    pub const DEFAULT_PREFIX: &'static str = "apps";
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(aliases: AliasStore) -> Self {
        Self::from_manifest(&ProviderManifest::of_kind("apps"), aliases)
    }

    pub fn from_manifest(manifest: &ProviderManifest, aliases: AliasStore) -> Self {
        let app_dirs = if manifest.app_dirs.is_empty() {
            default_app_dirs()
        } else {
            manifest.app_dirs.clone()
        };
        let icon_dirs = if manifest.icon_dirs.is_empty() {
            default_icon_dirs()
        } else {
            manifest.icon_dirs.clone()
        };
        let ttl = manifest
            .cache_ttl
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_TTL);

        Self {
            app_dirs: Arc::new(app_dirs),
            icon_dirs: Arc::new(icon_dirs),
            prefix: manifest.prefix_or(Some(Self::DEFAULT_PREFIX)),
            max_results: manifest.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            cache: EnumerationCache::new(ttl),
            aliases,
        }
    }

    async fn entries(&self) -> Arc<Vec<AppEntry>> {
        let app_dirs = self.app_dirs.clone();
        let icon_dirs = self.icon_dirs.clone();

        self.cache
            .get_or_load(|| async move {
                tokio::task::spawn_blocking(move || scan_app_dirs(&app_dirs, &icon_dirs))
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Application scan failed: {}", e);
                        Vec::new()
                    })
            })
            .await
    }
}

#[async_trait]
impl Provider for AppsProvider {
    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let entries = self.entries().await;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let q = query.to_lowercase();
        let targets = self.aliases.matching_targets(&q);

        Ok(entries
            .iter()
            .filter(|app| matches_with_aliases(&app.name, &q, &targets))
            .take(self.max_results)
            .map(|app| {
                SearchResult::new(&app.name, ACTION_EXEC, &app.exec)
                    .with_description("Application")
                    .with_icon(&app.icon)
            })
            .collect())
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        match item.action.as_str() {
            ACTION_EXEC => {
                debug!("Launching: {}", item.value);
                spawn_shell(&item.value, &[])
            }
            other => Err(ProviderError::UnsupportedAction(other.to_string())),
        }
    }

    fn aliases(&self) -> Option<&AliasStore> {
        Some(&self.aliases)
    }
}
