//! Error types for specification processing and tool synthesis.

use thiserror::Error;

/// Result type for mcpforge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Errors that can occur while turning a specification document into tools.
///
/// Dangling `$ref` pointers are deliberately absent from this list: the
/// resolver reports them as `None` and callers degrade to an opaque string
/// property instead of failing.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// The document has no usable `paths` structure.
    #[error("Failed to parse API specification: {0}")]
    Parse(String),

    /// Structural violations, raised only when the caller asks for strict mode.
    #[error("Specification failed validation with {} error(s): {}", .errors.len(), .errors.join("; "))]
    Validation {
        /// Human-readable error strings from the validation report
        errors: Vec<String>,
    },

    /// Building the tool for one endpoint failed.
    #[error("Failed to synthesize tool for {endpoint}: {reason}")]
    Synthesis {
        /// `METHOD /path` of the offending endpoint
        endpoint: String,
        /// What went wrong
        reason: String,
    },

    /// Two documents in a batch produced the same tool name.
    #[error("Duplicate tool name '{name}' produced by '{source_name}'")]
    DuplicateToolName {
        /// The colliding tool name
        name: String,
        /// The document that produced the second occurrence
        source_name: String,
    },

    /// Any other failure surfaced to the caller, with its cause preserved.
    #[error("Generation failed for '{source_name}'")]
    Generation {
        /// The document being processed
        source_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ForgeError {
    /// Helper for creating parse errors
    pub fn parse(msg: impl Into<String>) -> Self {
        ForgeError::Parse(msg.into())
    }

    /// Helper for creating per-endpoint synthesis errors
    pub fn synthesis(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        ForgeError::Synthesis {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary failure for the given document.
    pub fn generation(source_name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ForgeError::Generation {
            source_name: source_name.into(),
            source: source.into(),
        }
    }

    /// The message followed by every underlying cause, `: `-separated.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}
