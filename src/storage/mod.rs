//! Persisted state documents
//!
//! Alias maps and provider configuration are flat JSON documents that are
//! read wholesale and rewritten wholesale on every mutation. A missing file is
//! empty state, not an error.

mod provider_config;

pub use provider_config::{ProviderConfig, ProviderConfigStore};

use crate::error::{LoupeError, LoupeResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read a JSON document, returning the default value when the file is absent
pub fn read_document<T>(path: &Path) -> LoupeResult<T>
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(LoupeError::persistence(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| LoupeError::persistence(path, e))
}

/// Rewrite a JSON document in full
///
/// The document is written to a sibling temp file and renamed over the
/// target, so readers never observe a half-written file.
pub fn write_document<T>(path: &Path, document: &T) -> LoupeResult<()>
where
    T: Serialize + ?Sized,
{
    let json =
        serde_json::to_string_pretty(document).map_err(|e| LoupeError::persistence(path, e))?;
    write_atomic(path, json.as_bytes())
}

/// Write `contents` through a sibling temp file renamed over `path`
pub fn write_atomic(path: &Path, contents: &[u8]) -> LoupeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LoupeError::persistence(path, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).map_err(|e| LoupeError::persistence(path, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        LoupeError::persistence(path, e)
    })
}
