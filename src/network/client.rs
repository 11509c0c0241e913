//! HTTP client used to fetch provider manifests

use crate::config::SyncSettings;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper with Loupe-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&SyncSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &SyncSettings) -> Result<Self> {
        let timeout = settings.request_timeout()?;
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(format!("loupe/{}", crate::VERSION))
            .gzip(true);

        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            default_timeout: timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    async fn send(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        response
            .error_for_status()
            .with_context(|| format!("bad response from {}", url))
    }

    /// GET a URL and return its body as text
    pub async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.send(url).await?.text().await?)
    }

    /// GET a URL and decode its JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get_text(url).await?;
        serde_json::from_str(&text).with_context(|| format!("invalid JSON from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        assert!(HttpClient::new().is_ok());

        let proxied = SyncSettings {
            proxy: Some("http://127.0.0.1:3128".to_string()),
            request_timeout: 2.5,
            ..Default::default()
        };
        let client = HttpClient::with_settings(&proxied).unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(2500));

        let broken = SyncSettings {
            request_timeout: f64::INFINITY,
            ..Default::default()
        };
        assert!(HttpClient::with_settings(&broken).is_err());
    }

    #[tokio::test]
    async fn test_get_json_and_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["a","b"]"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let names: Vec<String> = client
            .get_json(&format!("{}/index.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(names, vec!["a", "b"]);

        assert!(client
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .is_err());
    }
}
