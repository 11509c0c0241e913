//! Folders directly under the user's common directories

use super::manifest::{ProviderManifest, DEFAULT_MAX_RESULTS};
use super::process::spawn_detached;
use super::traits::Provider;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const ACTION_OPEN_FOLDER: &str = "open-folder";
const FOLDER_ICON: &str = "📂";
const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// Common user folders, including Japanese-localized names
const STANDARD_SUBDIRS: &[&str] = &[
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Videos",
    "Desktop",
    "ドキュメント",
    "ダウンロード",
    "ピクチャ",
    "ミュージック",
    "ビデオ",
    "デスクトップ",
];

/// Home directory followed by its standard subfolders
pub fn default_search_dirs() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    let mut dirs = vec![home.clone()];
    dirs.extend(STANDARD_SUBDIRS.iter().map(|d| home.join(d)));
    dirs
}

/// Provider matching folder names
pub struct FilesProvider {
    search_dirs: Vec<PathBuf>,
    prefix: Option<String>,
    min_query_len: usize,
    max_results: usize,
}

impl FilesProvider {
    pub fn new() -> Self {
        Self::from_manifest(&ProviderManifest::of_kind("files"))
    }

    pub fn from_manifest(manifest: &ProviderManifest) -> Self {
        let search_dirs = if manifest.search_dirs.is_empty() {
            default_search_dirs()
        } else {
            manifest.search_dirs.clone()
        };

        Self {
            search_dirs,
            prefix: manifest.prefix_or(None),
            min_query_len: manifest.min_query_len.unwrap_or(DEFAULT_MIN_QUERY_LEN),
            max_results: manifest.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }

    /// Existing search dirs, de-duplicated by canonical path
    async fn unique_dirs(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        for dir in &self.search_dirs {
            let Ok(canonical) = tokio::fs::canonicalize(dir).await else {
                continue;
            };
            if seen.insert(canonical) {
                unique.push(dir.clone());
            }
        }
        unique
    }
}

impl Default for FilesProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-hidden child directories of `dir` whose name contains `query`
async fn matching_children(dir: &Path, query: &str) -> std::io::Result<Vec<SearchResult>> {
    let parent = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());

    let mut results = Vec::new();
    let mut listing = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = listing.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !name.to_lowercase().contains(query) {
            continue;
        }
        if !entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        results.push(
            SearchResult::new(&name, ACTION_OPEN_FOLDER, entry.path().to_string_lossy())
                .with_description(format!("Folder in {}", parent))
                .with_icon(FOLDER_ICON),
        );
    }

    Ok(results)
}

#[async_trait]
impl Provider for FilesProvider {
    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        if query.chars().count() < self.min_query_len {
            return Ok(Vec::new());
        }

        let q = query.to_lowercase();
        let mut results = Vec::new();

        for dir in self.unique_dirs().await {
            match matching_children(&dir, &q).await {
                Ok(found) => results.extend(found),
                // Unreadable directories are skipped
                Err(e) => debug!("Skipping {}: {}", dir.display(), e),
            }
            if results.len() >= self.max_results {
                break;
            }
        }

        results.truncate(self.max_results);
        Ok(results)
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        match item.action.as_str() {
            ACTION_OPEN_FOLDER => {
                debug!("Opening folder: {}", item.value);
                spawn_detached("xdg-open", [item.value.as_str()], &[])
            }
            other => Err(ProviderError::UnsupportedAction(other.to_string())),
        }
    }
}
