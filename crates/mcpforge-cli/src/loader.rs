//! Fetching document text from files and URLs.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Retrieves the raw text of a specification document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, location: &str) -> Result<String>;

    /// Load and decode JSON or YAML into a document value.
    async fn load_document(&self, location: &str) -> Result<Value> {
        let text = self.load(location).await?;
        mcpforge_core::decode_document(&text)
            .with_context(|| format!("Failed to decode document: {}", location))
    }
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileLoader;

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, location: &str) -> Result<String> {
        let path = PathBuf::from(location);
        tracing::debug!("Reading document from {:?}", path);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read document: {:?}", path))
    }
}

/// Downloads documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mcpforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, location: &str) -> Result<String> {
        let url = Url::parse(location).with_context(|| format!("Invalid URL: {}", location))?;
        tracing::debug!("Fetching document from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Fetching {} returned HTTP {}", url, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

/// Dispatches `http://` and `https://` locations to [`HttpLoader`], everything
/// else to [`FileLoader`].
#[derive(Debug, Clone)]
pub struct SourceLoader {
    file: FileLoader,
    http: HttpLoader,
}

impl SourceLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            file: FileLoader,
            http: HttpLoader::new(timeout)?,
        })
    }

    pub fn is_remote(location: &str) -> bool {
        Url::parse(location)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentLoader for SourceLoader {
    async fn load(&self, location: &str) -> Result<String> {
        if Self::is_remote(location) {
            self.http.load(location).await
        } else {
            self.file.load(location).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(SourceLoader::is_remote("https://api.example.com/openapi.json"));
        assert!(SourceLoader::is_remote("http://localhost:8080/spec.yaml"));
        assert!(!SourceLoader::is_remote("./openapi.yaml"));
        assert!(!SourceLoader::is_remote("/etc/specs/api.json"));
        assert!(!SourceLoader::is_remote("file:///etc/specs/api.json"));
    }

    #[tokio::test]
    async fn test_file_loader_decodes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        std::fs::write(&path, "openapi: 3.0.0\npaths: {}\n").unwrap();

        let doc = FileLoader.load_document(path.to_str().unwrap()).await.unwrap();
        assert_eq!(doc["openapi"], "3.0.0");
    }

    #[tokio::test]
    async fn test_file_loader_missing_file() {
        let err = FileLoader.load("/no/such/api.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }
}
