//! # mcpforge telemetry
//!
//! Structured logging for the generator.
//!
//! Installs a `tracing` subscriber with an env-filter and either a
//! human-readable or a JSON formatter, and provides span helpers so every
//! document and synthesized tool can be followed through the logs.

mod spans;
mod tracer;

pub use spans::{DocumentSpanAttributes, document_span, record_document_result, record_tool_synthesized};
pub use tracer::{LogFormat, LoggingConfig, init_telemetry};

/// Field names used on generator spans and events.
pub mod attributes {
    // Document attributes
    pub const DOCUMENT_SOURCE: &str = "mcpforge.document.source";
    pub const DOCUMENT_TITLE: &str = "mcpforge.document.title";
    pub const DOCUMENT_VERSION: &str = "mcpforge.document.version";
    pub const DOCUMENT_VALID: &str = "mcpforge.document.valid";
    pub const DOCUMENT_TOOL_COUNT: &str = "mcpforge.document.tool_count";

    // Tool attributes
    pub const TOOL_NAME: &str = "mcpforge.tool.name";
    pub const TOOL_METHOD: &str = "mcpforge.tool.method";
    pub const TOOL_PATH: &str = "mcpforge.tool.path";
    pub const TOOL_PARAMETER_COUNT: &str = "mcpforge.tool.parameter_count";

    pub const SYSTEM_NAME: &str = "mcpforge";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_constants() {
        assert_eq!(attributes::DOCUMENT_SOURCE, "mcpforge.document.source");
        assert_eq!(attributes::TOOL_NAME, "mcpforge.tool.name");
        assert!(attributes::TOOL_PATH.starts_with(attributes::SYSTEM_NAME));
    }
}
