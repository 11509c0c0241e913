//! Plugin commands backed by shell scripts
//!
//! `search_command` runs through `sh -c` with the query as `$1` and in
//! `LOUPE_QUERY`. It must print a JSON array of results on stdout.
//! `execute_command` is spawned detached with the chosen result in
//! `LOUPE_ACTION`, `LOUPE_VALUE` and `LOUPE_TITLE`.

use super::manifest::ProviderManifest;
use super::process::spawn_shell;
use super::traits::Provider;
use crate::error::ProviderError;
use crate::results::SearchResult;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub struct ScriptProvider {
    search_command: String,
    execute_command: String,
    prefix: Option<String>,
    max_results: usize,
}

impl ScriptProvider {
    pub fn new(search_command: impl Into<String>, execute_command: impl Into<String>) -> Self {
        Self {
            search_command: search_command.into(),
            execute_command: execute_command.into(),
            prefix: None,
            max_results: ProviderManifest::default().max_results(),
        }
    }

    /// Build from a manifest; `None` when either command is missing
    pub fn from_manifest(manifest: &ProviderManifest) -> Option<Self> {
        let search = manifest.search_command.as_deref()?.trim();
        let execute = manifest.execute_command.as_deref()?.trim();
        if search.is_empty() || execute.is_empty() {
            return None;
        }

        Some(Self {
            prefix: manifest.prefix_or(None),
            max_results: manifest.max_results(),
            ..Self::new(search, execute)
        })
    }
}

#[async_trait]
impl Provider for ScriptProvider {
    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let output = Command::new("sh")
            .args(["-c", self.search_command.as_str(), "loupe", query])
            .env("LOUPE_QUERY", query)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProviderError::command(&self.search_command, e))?;

        if !output.status.success() {
            return Err(ProviderError::command(
                &self.search_command,
                format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<SearchResult> =
            serde_json::from_str(&stdout).map_err(|e| ProviderError::Parse(e.to_string()))?;
        results.truncate(self.max_results);

        debug!(
            "Script '{}' returned {} results",
            self.search_command,
            results.len()
        );
        Ok(results)
    }

    fn execute(&self, item: &SearchResult) -> Result<(), ProviderError> {
        spawn_shell(
            &self.execute_command,
            &[
                ("LOUPE_ACTION", item.action.as_str()),
                ("LOUPE_VALUE", item.value.as_str()),
                ("LOUPE_TITLE", item.title.as_str()),
            ],
        )
    }
}
