//! Plugin distributor and provider sync
//!
//! A distributor lists remote provider manifests and fetches their contents.
//! [`PluginSync`] downloads every listed manifest before writing any of them,
//! so a failed sync leaves the local providers directory untouched.

use crate::error::{LoupeError, LoupeResult};
use crate::network::HttpClient;
use crate::providers::manifest::MANIFEST_EXTENSIONS;
use crate::providers::ProviderRegistry;
use crate::storage::write_atomic;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

/// An entry of the remote provider index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProviderFile {
    /// File name to write into the providers directory
    pub name: String,
    /// Where to download the manifest from; may be relative to the index
    #[serde(alias = "download_url")]
    pub content_url: String,
}

/// Source of remote provider manifests
#[async_trait]
pub trait PluginDistributor: Send + Sync {
    async fn list_remote_provider_files(&self) -> LoupeResult<Vec<RemoteProviderFile>>;

    async fn fetch_provider_source(&self, url: &str) -> LoupeResult<String>;
}

/// Distributor backed by a JSON index served over HTTP
pub struct HttpDistributor {
    client: HttpClient,
    index_url: Url,
}

impl HttpDistributor {
    pub fn new(client: HttpClient, index_url: &str) -> LoupeResult<Self> {
        let index_url = Url::parse(index_url)
            .map_err(|e| LoupeError::Config(format!("invalid plugin index URL '{}': {}", index_url, e)))?;
        Ok(Self { client, index_url })
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    fn resolve(&self, url: &str) -> LoupeResult<String> {
        self.index_url
            .join(url)
            .map(String::from)
            .map_err(|e| LoupeError::Distributor(format!("invalid content URL '{}': {}", url, e)))
    }
}

#[async_trait]
impl PluginDistributor for HttpDistributor {
    async fn list_remote_provider_files(&self) -> LoupeResult<Vec<RemoteProviderFile>> {
        let files: Vec<RemoteProviderFile> = self
            .client
            .get_json(self.index_url.as_str())
            .await
            .map_err(|e| LoupeError::Distributor(format!("{:#}", e)))?;

        files
            .into_iter()
            .map(|file| {
                let content_url = self.resolve(&file.content_url)?;
                Ok(RemoteProviderFile {
                    name: file.name,
                    content_url,
                })
            })
            .collect()
    }

    async fn fetch_provider_source(&self, url: &str) -> LoupeResult<String> {
        self.client
            .get_text(url)
            .await
            .map_err(|e| LoupeError::Distributor(format!("{:#}", e)))
    }
}

/// Whether `name` is a plain manifest file name safe to write into the providers dir
pub fn is_safe_manifest_name(name: &str) -> bool {
    let path = Path::new(name);
    let is_plain = path.file_name().and_then(|n| n.to_str()) == Some(name);
    let has_manifest_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        .unwrap_or(false);

    is_plain && has_manifest_ext && !name.starts_with('.') && !name.contains('\\')
}

/// Downloads remote manifests into the providers directory
///
/// Syncs on one instance run one at a time.
pub struct PluginSync {
    distributor: Arc<dyn PluginDistributor>,
    dir: PathBuf,
    running: Mutex<()>,
}

impl PluginSync {
    pub fn new(distributor: Arc<dyn PluginDistributor>, dir: impl Into<PathBuf>) -> Self {
        Self {
            distributor,
            dir: dir.into(),
            running: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetch every remote manifest, then write them all
    ///
    /// Returns the number of files written. Nothing is written unless every
    /// fetch succeeded.
    pub async fn sync(&self) -> LoupeResult<usize> {
        let _running = self.running.lock().await;

        let files = self.distributor.list_remote_provider_files().await?;
        debug!("Remote index lists {} provider files", files.len());

        let mut fetched = Vec::with_capacity(files.len());
        for file in files {
            if !is_safe_manifest_name(&file.name) {
                warn!("Skipping remote provider with unsafe name: {}", file.name);
                continue;
            }
            let source = self
                .distributor
                .fetch_provider_source(&file.content_url)
                .await?;
            fetched.push((file.name, source));
        }

        let dir = self.dir.clone();
        let written = tokio::task::spawn_blocking(move || {
            for (name, source) in &fetched {
                write_atomic(&dir.join(name), source.as_bytes())?;
            }
            Ok::<_, LoupeError>(fetched.len())
        })
        .await
        .map_err(|e| LoupeError::persistence(&self.dir, e))??;

        info!("Synced {} providers into {}", written, self.dir.display());
        Ok(written)
    }

    /// Sync, then reload the registry; a failed sync leaves the registry as is
    pub async fn sync_and_reload(&self, registry: &Arc<ProviderRegistry>) -> LoupeResult<usize> {
        match self.sync().await {
            Ok(_) => Ok(registry.load_async().await),
            Err(e) => {
                error!("Provider sync failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderLoader;
    use crate::storage::ProviderConfigStore;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, at: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn distributor(server: &MockServer) -> Arc<dyn PluginDistributor> {
        Arc::new(
            HttpDistributor::new(
                HttpClient::new().unwrap(),
                &format!("{}/plugins/index.json", server.uri()),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_safe_manifest_names() {
        assert!(is_safe_manifest_name("apps.yml"));
        assert!(is_safe_manifest_name("notes.yaml"));
        assert!(!is_safe_manifest_name("../apps.yml"));
        assert!(!is_safe_manifest_name("nested/apps.yml"));
        assert!(!is_safe_manifest_name(".hidden.yml"));
        assert!(!is_safe_manifest_name("script.sh"));
        assert!(!is_safe_manifest_name(""));
    }

    #[test]
    fn test_index_accepts_download_url() {
        let files: Vec<RemoteProviderFile> = serde_json::from_str(
            r#"[{"name":"a.yml","content_url":"a"},{"name":"b.yml","download_url":"b"}]"#,
        )
        .unwrap();
        assert_eq!(files[1].content_url, "b");
    }

    #[test]
    fn test_invalid_index_url() {
        assert!(matches!(
            HttpDistributor::new(HttpClient::new().unwrap(), "not a url"),
            Err(LoupeError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_writes_manifests_and_reloads() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/plugins/index.json",
            200,
            r#"[
                {"name": "calc.yml", "content_url": "calc.yml"},
                {"name": "../escape.yml", "content_url": "calc.yml"}
            ]"#,
        )
        .await;
        mount(&server, "/plugins/calc.yml", 200, "kind: calculator\n").await;

        let tmp = tempfile::tempdir().unwrap();
        let providers_dir = tmp.path().join("providers");
        let registry = Arc::new(ProviderRegistry::new(
            Arc::new(ProviderLoader::new(&providers_dir, tmp.path().join("aliases.json"))),
            ProviderConfigStore::new(tmp.path().join("providers.json")),
        ));

        let sync = PluginSync::new(distributor(&server), &providers_dir);
        assert_eq!(sync.sync_and_reload(&registry).await.unwrap(), 1);
        assert_eq!(registry.names(), vec!["calc"]);
        assert_eq!(
            fs::read_to_string(providers_dir.join("calc.yml")).unwrap(),
            "kind: calculator\n"
        );
        assert!(!tmp.path().join("escape.yml").exists());
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/plugins/index.json",
            200,
            r#"[
                {"name": "calc.yml", "content_url": "calc.yml"},
                {"name": "gone.yml", "content_url": "gone.yml"}
            ]"#,
        )
        .await;
        mount(&server, "/plugins/calc.yml", 200, "kind: calculator\n").await;
        mount(&server, "/plugins/gone.yml", 500, "").await;

        let tmp = tempfile::tempdir().unwrap();
        let providers_dir = tmp.path().join("providers");
        fs::create_dir_all(&providers_dir).unwrap();
        fs::write(providers_dir.join("files.yml"), "kind: files\n").unwrap();

        let registry = Arc::new(ProviderRegistry::new(
            Arc::new(ProviderLoader::new(&providers_dir, tmp.path().join("aliases.json"))),
            ProviderConfigStore::new(tmp.path().join("providers.json")),
        ));
        registry.load();

        let sync = PluginSync::new(distributor(&server), &providers_dir);
        let result = sync.sync_and_reload(&registry).await;

        assert!(matches!(result, Err(LoupeError::Distributor(_))));
        assert!(!providers_dir.join("calc.yml").exists());
        assert_eq!(registry.names(), vec!["files"]);
    }

    /// Distributor that records how many syncs are inside it at once
    struct CountingDistributor {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PluginDistributor for CountingDistributor {
        async fn list_remote_provider_files(&self) -> LoupeResult<Vec<RemoteProviderFile>> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(vec![RemoteProviderFile {
                name: "calc.yml".to_string(),
                content_url: "calc.yml".to_string(),
            }])
        }

        async fn fetch_provider_source(&self, _url: &str) -> LoupeResult<String> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok("kind: calculator\n".to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrent_syncs_are_serialized() {
        let tmp = tempfile::tempdir().unwrap();
        let distributor = Arc::new(CountingDistributor {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let sync = PluginSync::new(distributor.clone(), tmp.path());

        let (first, second) = tokio::join!(sync.sync(), sync.sync());

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(distributor.peak.load(Ordering::SeqCst), 1);
        assert!(tmp.path().join("calc.yml").exists());
        assert!(!tmp.path().join("calc.yml.tmp").exists());
    }

    #[tokio::test]
    async fn test_unreachable_index() {
        let server = MockServer::start().await;
        mount(&server, "/plugins/index.json", 200, "not json").await;

        let tmp = tempfile::tempdir().unwrap();
        let sync = PluginSync::new(distributor(&server), tmp.path());
        assert!(matches!(sync.sync().await, Err(LoupeError::Distributor(_))));
    }
}
