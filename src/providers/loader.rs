//! Provider loader for instantiating providers from manifest files

use super::apps::AppsProvider;
use super::calculator::CalculatorProvider;
use super::files::FilesProvider;
use super::flatpak::FlatpakProvider;
use super::manifest::{ProviderManifest, MANIFEST_EXTENSIONS};
use super::script::ScriptProvider;
use super::traits::{Provider, ProviderSource, RegisteredProvider};
use crate::aliases::AliasStore;
use crate::error::{LoupeError, LoupeResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Built-in kinds installed when the providers directory is empty
const DEFAULT_KINDS: &[&str] = &["apps", "flatpak", "files", "calculator"];

/// Discovers providers from the manifests in a directory
pub struct ProviderLoader {
    dir: PathBuf,
    aliases_path: PathBuf,
}

impl ProviderLoader {
    pub fn new(dir: impl Into<PathBuf>, aliases_path: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            aliases_path: aliases_path.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest files in the providers directory, sorted by file name
    pub fn manifest_paths(&self) -> LoupeResult<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_manifest(path))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    pub fn has_manifests(&self) -> bool {
        self.manifest_paths()
            .map(|paths| !paths.is_empty())
            .unwrap_or(false)
    }

    /// Write manifests for the built-in kinds when none exist
    ///
    /// Returns the number of manifests written.
    pub fn install_defaults(&self) -> LoupeResult<usize> {
        if !self.manifest_paths()?.is_empty() {
            return Ok(0);
        }

        for kind in DEFAULT_KINDS {
            let yaml = serde_yaml::to_string(&ProviderManifest::of_kind(*kind))?;
            fs::write(self.dir.join(format!("{}.yml", kind)), yaml)?;
        }

        info!(
            "Installed {} default providers into {}",
            DEFAULT_KINDS.len(),
            self.dir.display()
        );
        Ok(DEFAULT_KINDS.len())
    }

    fn load_manifest(path: &Path) -> LoupeResult<ProviderManifest> {
        let content = fs::read_to_string(path)?;
        Ok(ProviderManifest::from_yaml(&content)?)
    }

    /// Create a provider instance from its manifest
    pub fn create_provider(
        &self,
        name: &str,
        manifest: &ProviderManifest,
    ) -> LoupeResult<Arc<dyn Provider>> {
        let provider: Arc<dyn Provider> = match manifest.kind.as_str() {
            "apps" => Arc::new(AppsProvider::from_manifest(manifest, self.alias_store())),
            "flatpak" => Arc::new(FlatpakProvider::from_manifest(manifest, self.alias_store())),
            "files" => Arc::new(FilesProvider::from_manifest(manifest)),
            "calculator" => Arc::new(CalculatorProvider::new()),
            "script" => Arc::new(ScriptProvider::from_manifest(manifest).ok_or_else(|| {
                LoupeError::provider_load(name, "script requires search_command and execute_command")
            })?),
            "" => return Err(LoupeError::provider_load(name, "missing kind")),
            other => {
                return Err(LoupeError::provider_load(
                    name,
                    format!("unknown provider kind: {}", other),
                ))
            }
        };

        Ok(provider)
    }

    fn alias_store(&self) -> AliasStore {
        AliasStore::load(&self.aliases_path)
    }

    /// Get list of available provider kinds
    pub fn available_kinds() -> Vec<&'static str> {
        vec!["apps", "flatpak", "files", "calculator", "script"]
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

impl ProviderSource for ProviderLoader {
    fn discover(&self) -> Vec<RegisteredProvider> {
        let paths = match self.manifest_paths() {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Failed to read providers from {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut providers = Vec::new();

        for path in paths {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            if seen.contains(&name) {
                warn!(
                    "{}",
                    LoupeError::provider_load(&name, format!("duplicate name ({})", path.display()))
                );
                continue;
            }

            let created = Self::load_manifest(&path)
                .map_err(|e| LoupeError::provider_load(&name, e))
                .and_then(|manifest| {
                    self.create_provider(&name, &manifest)
                        .map(|provider| (manifest.kind, provider))
                });

            match created {
                Ok((kind, provider)) => {
                    debug!("Loaded provider: {} ({})", name, kind);
                    seen.insert(name.clone());
                    providers.push(RegisteredProvider::new(name, provider));
                }
                Err(e) => warn!("{}", e),
            }
        }

        info!("Discovered {} providers", providers.len());
        providers
    }
}
