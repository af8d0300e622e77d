//! The generation manifest written by `generate`.

use crate::batch::DocumentResult;
use anyhow::{Context, Result};
use mcpforge_core::{McpToolSpec, Server, ValidationReport};
use serde::Serialize;
use std::path::Path;

/// Everything handed to the code generator: per-document metadata plus the
/// merged tool list.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationManifest {
    pub documents: Vec<DocumentSummary>,
    pub tools: Vec<McpToolSpec>,
}

/// Metadata of one processed (or failed) document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub servers: Vec<Server>,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    pub tool_count: usize,
    /// Why the document produced no tools at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentSummary {
    pub fn from_result(result: &DocumentResult) -> Self {
        match &result.outcome {
            Ok(output) => Self {
                source: result.name().to_string(),
                title: output.info.title.clone(),
                version: output.info.version.clone(),
                servers: output.servers.clone(),
                base_url: output.base_url.clone(),
                validation: Some(output.validation.clone()),
                tool_count: output.tools.len(),
                error: None,
            },
            Err(e) => Self {
                source: result.name().to_string(),
                title: None,
                version: None,
                servers: Vec::new(),
                base_url: String::new(),
                validation: None,
                tool_count: 0,
                error: Some(e.chain_message()),
            },
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

impl GenerationManifest {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize manifest")
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        tokio::fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("Failed to write manifest: {:?}", path))
    }
}
