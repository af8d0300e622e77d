//! Processing many documents concurrently.
//!
//! Documents are loaded asynchronously and each pipeline runs on a blocking
//! task. At most `workers` documents are in flight, and results come back
//! in the order the sources were given.

use crate::config::SourceConfig;
use crate::loader::DocumentLoader;
use futures::stream::{self, StreamExt};
use mcpforge_core::{DocumentOutput, ForgeError, SynthesisOptions, process_document};
use mcpforge_telemetry::{
    DocumentSpanAttributes, document_span, record_document_result, record_tool_synthesized,
};
use std::sync::Arc;
use tracing::{Instrument, warn};

/// Result of one source in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub source: SourceConfig,
    pub outcome: Result<DocumentOutput, ForgeError>,
}

impl DocumentResult {
    pub fn name(&self) -> &str {
        self.source.display_name()
    }
}

/// Runs the pipeline over a list of sources.
pub struct BatchRunner {
    loader: Arc<dyn DocumentLoader>,
    options: SynthesisOptions,
    workers: usize,
}

impl BatchRunner {
    pub fn new(loader: Arc<dyn DocumentLoader>, options: SynthesisOptions, workers: usize) -> Self {
        Self {
            loader,
            options,
            workers: workers.max(1),
        }
    }

    /// Process every source; one failing document never stops the others.
    pub async fn run(&self, sources: Vec<SourceConfig>) -> Vec<DocumentResult> {
        stream::iter(sources)
            .map(|source| self.process(source))
            .buffered(self.workers)
            .collect()
            .await
    }

    async fn process(&self, source: SourceConfig) -> DocumentResult {
        let name = source.display_name().to_string();
        let span = document_span(&name);
        let outcome = self
            .load_and_process(&source, &name)
            .instrument(span.clone())
            .await;

        match &outcome {
            Ok(output) => {
                record_document_result(
                    &span,
                    &DocumentSpanAttributes {
                        title: output.info.title.clone(),
                        version: output.info.version.clone(),
                        is_valid: output.validation.is_valid,
                        tool_count: output.tools.len(),
                    },
                );
            }
            Err(e) => warn!("Skipping {}: {}", name, e.chain_message()),
        }

        DocumentResult { source, outcome }
    }

    async fn load_and_process(&self, source: &SourceConfig, name: &str) -> Result<DocumentOutput, ForgeError> {
        let document = self
            .loader
            .load_document(&source.location)
            .await
            .map_err(|e| ForgeError::generation(name, e))?;

        let options = self.options.clone();
        let source_name = name.to_string();
        let span = tracing::Span::current();
        let task = tokio::task::spawn_blocking(move || -> Result<DocumentOutput, ForgeError> {
            let _guard = span.enter();
            let output = process_document(&source_name, &document, &options)?;
            for tool in &output.tools {
                record_tool_synthesized(
                    &tool.name,
                    tool.method.as_str(),
                    &tool.path,
                    tool.input_schema.properties.len(),
                );
            }
            Ok(output)
        });

        task.await.map_err(|e| ForgeError::generation(name, e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves canned documents; documents listed early answer last.
    struct CannedLoader {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl DocumentLoader for CannedLoader {
        async fn load(&self, location: &str) -> Result<String> {
            let delay = match location {
                "first" => 30,
                "second" => 10,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.documents
                .get(location)
                .cloned()
                .ok_or_else(|| anyhow!("no document at {}", location))
        }
    }

    fn document(title: &str) -> String {
        serde_json::json!({
            "openapi": "3.0.0",
            "info": {"title": title, "version": "1"},
            "paths": {"/items": {"get": {"responses": {"200": {"description": "ok"}}}}}
        })
        .to_string()
    }

    fn runner(workers: usize) -> BatchRunner {
        let documents = HashMap::from([
            ("first".to_string(), document("First")),
            ("second".to_string(), document("Second")),
            ("third".to_string(), document("Third")),
            ("broken".to_string(), "{\"openapi\": \"3.0.0\"}".to_string()),
        ]);
        BatchRunner::new(Arc::new(CannedLoader { documents }), SynthesisOptions::default(), workers)
    }

    #[tokio::test]
    async fn test_results_keep_source_order() {
        let sources = ["first", "second", "third"].map(SourceConfig::new).to_vec();
        let results = runner(3).run(sources).await;

        let titles: Vec<_> = results
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().info.title.clone().unwrap())
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_failures_stay_per_document() {
        let sources = ["first", "broken", "missing", "third"].map(SourceConfig::new).to_vec();
        let results = runner(2).run(sources).await;

        assert_eq!(results.len(), 4);
        assert!(results[0].outcome.is_ok());
        assert!(matches!(results[1].outcome, Err(ForgeError::Parse(_))));
        assert!(matches!(results[2].outcome, Err(ForgeError::Generation { .. })));
        assert!(results[3].outcome.is_ok());
        assert_eq!(results[2].name(), "missing");
    }
}
