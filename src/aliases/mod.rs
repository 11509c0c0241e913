//! User-defined aliases that widen what a provider matches
//!
//! An alias maps a short key (`ff`) to a target string (`firefox`). When the
//! user's query is a prefix of a key, providers additionally match their
//! entries against the key's target.

use crate::error::LoupeResult;
use crate::storage::{read_document, write_document};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mapping of alias key to expansion target
pub type AliasMap = BTreeMap<String, String>;

/// In-memory alias cache backed by the persisted alias document
#[derive(Debug)]
pub struct AliasStore {
    path: PathBuf,
    aliases: RwLock<AliasMap>,
}

impl AliasStore {
    /// Load eagerly from `path`
    ///
    /// A missing file yields an empty map. Malformed content is logged and
    /// also yields an empty map; a later [`reload`](Self::reload) can recover.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let aliases = match read_document::<AliasMap>(&path) {
            Ok(aliases) => aliases,
            Err(e) => {
                warn!("Failed to load aliases: {}", e);
                AliasMap::new()
            }
        };

        Self {
            path,
            aliases: RwLock::new(aliases),
        }
    }

    /// A store with fixed contents, not tied to any readable file
    pub fn from_map(path: impl Into<PathBuf>, aliases: AliasMap) -> Self {
        Self {
            path: path.into(),
            aliases: RwLock::new(aliases),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing document, replacing the in-memory map wholesale
    ///
    /// On failure the previous map stays in effect.
    pub fn reload(&self) -> LoupeResult<()> {
        let aliases: AliasMap = read_document(&self.path)?;
        debug!("Reloaded {} aliases from {}", aliases.len(), self.path.display());
        *self.aliases.write() = aliases;
        Ok(())
    }

    /// Copy of the current map
    pub fn snapshot(&self) -> AliasMap {
        self.aliases.read().clone()
    }

    pub fn len(&self) -> usize {
        self.aliases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.read().is_empty()
    }

    /// Lowercased targets of every alias whose key starts with `query`
    ///
    /// `query` is expected to be lowercased already.
    pub fn matching_targets(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }

        self.aliases
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(query))
            .map(|(_, target)| target.to_lowercase())
            .collect()
    }
}

/// Read the alias document for the presentation client
pub fn read_alias_map(path: &Path) -> LoupeResult<AliasMap> {
    read_document(path)
}

/// Persist an edited alias document
pub fn write_alias_map(path: &Path, aliases: &AliasMap) -> LoupeResult<()> {
    write_document(path, aliases)
}

/// Whether `haystack` contains the query or any alias target
///
/// Both `query` and `targets` are expected to be lowercased.
pub fn matches_with_aliases(haystack: &str, query: &str, targets: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    haystack.contains(query) || targets.iter().any(|t| haystack.contains(t.as_str()))
}
