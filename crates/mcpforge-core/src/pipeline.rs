//! Per-document pipeline and batch merging.

use crate::base_url::derive_base_url;
use crate::error::{ForgeError, Result};
use crate::naming::document_slug;
use crate::normalizer::normalize;
use crate::synthesizer::{SynthesisOptions, synthesize_tools};
use crate::tool::McpToolSpec;
use crate::types::{ApiInfo, Server};
use crate::validator::{ValidationReport, validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Everything produced for one input document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutput {
    /// Where the document came from (path, URL or configured name)
    pub source: String,
    pub info: ApiInfo,
    pub servers: Vec<Server>,
    /// Derived base URL, empty if the document declares none
    pub base_url: String,
    pub validation: ValidationReport,
    pub tools: Vec<McpToolSpec>,
}

/// Normalize, validate and synthesize one decoded document.
///
/// Only a missing or malformed `paths` object fails here. An invalid report
/// is returned alongside the tools; callers wanting strict behaviour check
/// [`ValidationReport::is_valid`] themselves.
pub fn process_document(
    source: &str,
    document: &Value,
    options: &SynthesisOptions,
) -> Result<DocumentOutput> {
    let spec = normalize(document)?;
    let validation = validate(&spec);
    if !validation.is_valid {
        warn!(
            "{} has {} validation error(s); generating anyway",
            source,
            validation.errors.len()
        );
    }

    let tools = synthesize_tools(&spec, options);
    info!("{}: {} tools", source, tools.len());

    Ok(DocumentOutput {
        source: source.to_string(),
        base_url: derive_base_url(&spec),
        info: spec.info,
        servers: spec.servers,
        validation,
        tools,
    })
}

/// What to do when two tools in a batch share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Rename the later tool to `{document}_{name}`
    #[default]
    Prefix,
    /// Keep both tools under the same name
    Keep,
    /// Abort the merge
    Fail,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefix" => Ok(CollisionPolicy::Prefix),
            "keep" => Ok(CollisionPolicy::Keep),
            "fail" => Ok(CollisionPolicy::Fail),
            other => Err(format!("unknown collision policy '{other}' (expected prefix, keep or fail)")),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Prefix => write!(f, "prefix"),
            CollisionPolicy::Keep => write!(f, "keep"),
            CollisionPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Concatenate the tools of every document in the given order.
pub fn merge_tool_sets(outputs: &[DocumentOutput], policy: CollisionPolicy) -> Result<Vec<McpToolSpec>> {
    let mut merged = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    for output in outputs {
        let slug = document_slug(output.info.title.as_deref().unwrap_or(&output.source));

        for tool in &output.tools {
            let mut tool = tool.clone();
            if taken.contains(&tool.name) {
                match policy {
                    CollisionPolicy::Keep => {
                        warn!("Duplicate tool name '{}' from {}", tool.name, output.source);
                    }
                    CollisionPolicy::Fail => {
                        return Err(ForgeError::DuplicateToolName {
                            name: tool.name,
                            source_name: output.source.clone(),
                        });
                    }
                    CollisionPolicy::Prefix => {
                        let renamed = unique_name(&format!("{}_{}", slug, tool.name), &taken);
                        warn!(
                            "Duplicate tool name '{}' from {}; renamed to '{}'",
                            tool.name, output.source, renamed
                        );
                        tool.name = renamed;
                    }
                }
            }
            taken.insert(tool.name.clone());
            merged.push(tool);
        }
    }

    Ok(merged)
}

fn unique_name(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{candidate}_{n}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(title: &str, operation_id: &str) -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": title, "version": "1.0"},
            "servers": [{"url": "https://api.example.com"}],
            "paths": {"/items": {"get": {
                "operationId": operation_id,
                "responses": {"200": {"description": "ok"}}
            }}}
        })
    }

    fn outputs() -> Vec<DocumentOutput> {
        let options = SynthesisOptions::default();
        vec![
            process_document("a.yaml", &document("Pet Store", "listItems"), &options).unwrap(),
            process_document("b.yaml", &document("Inventory", "listItems"), &options).unwrap(),
            process_document("c.yaml", &document("Inventory", "listItems"), &options).unwrap(),
        ]
    }

    #[test]
    fn test_process_document() {
        let output = process_document("a.yaml", &document("Pet Store", "listItems"), &SynthesisOptions::default()).unwrap();
        assert_eq!(output.base_url, "https://api.example.com");
        assert_eq!(output.info.title.as_deref(), Some("Pet Store"));
        assert_eq!(output.tools.len(), 1);
        assert!(output.validation.is_valid);
    }

    #[test]
    fn test_missing_paths_fails_document() {
        let err = process_document("x", &json!({"openapi": "3.0.0"}), &SynthesisOptions::default()).unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));
    }

    #[test]
    fn test_invalid_document_still_yields_tools() {
        let mut doc = document("Pet Store", "listItems");
        doc["info"].as_object_mut().unwrap().remove("version");
        let output = process_document("a.yaml", &doc, &SynthesisOptions::default()).unwrap();
        assert!(!output.validation.is_valid);
        assert_eq!(output.tools.len(), 1);
    }

    #[test]
    fn test_merge_prefix() {
        let merged = merge_tool_sets(&outputs(), CollisionPolicy::Prefix).unwrap();
        let names: Vec<_> = merged.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["list_items", "inventory_list_items", "inventory_list_items_2"]);
    }

    #[test]
    fn test_merge_keep_and_fail() {
        let merged = merge_tool_sets(&outputs(), CollisionPolicy::Keep).unwrap();
        assert!(merged.iter().all(|t| t.name == "list_items"));

        let err = merge_tool_sets(&outputs(), CollisionPolicy::Fail).unwrap_err();
        match err {
            ForgeError::DuplicateToolName { name, source_name } => {
                assert_eq!(name, "list_items");
                assert_eq!(source_name, "b.yaml");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collision_policy_parsing() {
        assert_eq!("Prefix".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Prefix));
        assert_eq!("fail".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Fail));
        assert!("merge".parse::<CollisionPolicy>().is_err());
        assert_eq!(CollisionPolicy::default().to_string(), "prefix");
    }
}
