use clap::{Parser, Subcommand};
use mcpforge_core::CollisionPolicy;
use mcpforge_telemetry::LogFormat;
use std::path::PathBuf;

/// Command-line interface for mcpforge
///
/// Turns OpenAPI 3.x and Swagger 2.0 documents into MCP tool descriptors.
#[derive(Debug, Parser)]
#[command(name = "mcpforge", version)]
#[command(about = "Generate MCP tool descriptors from OpenAPI documents", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: mcpforge.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log filter, e.g. `debug` or `mcpforge_core=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate tool descriptors for one or more documents
    Generate(GenerateArgs),

    /// Validate a single document and print the report
    ///
    /// Exits with status 1 when the document has structural errors.
    Validate {
        /// File path or http(s) URL of the document
        source: String,
    },
}

/// Arguments of `generate`. Unset options fall back to the configuration file.
#[derive(Debug, Default, clap::Args)]
pub struct GenerateArgs {
    /// File paths or http(s) URLs; replaces the configured sources
    pub sources: Vec<String>,

    /// Where to write the manifest
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base URL written into every tool instead of the documents' own
    #[arg(long)]
    pub base_url: Option<String>,

    /// Abort when any document fails validation
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Maximum number of documents processed at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// What to do with duplicate tool names across documents
    #[arg(long)]
    pub collision: Option<CollisionPolicy>,
}
