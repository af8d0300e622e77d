//! # mcpforge CLI
//!
//! Loads OpenAPI and Swagger documents from files or URLs, runs them through
//! [`mcpforge_core`] concurrently and writes one JSON manifest of tools.

pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod loader;
pub mod output;

pub use batch::{BatchRunner, DocumentResult};
pub use cli::{Cli, Commands, GenerateArgs};
pub use commands::{GenerateOutcome, generate, run_generate, run_validate};
pub use config::{ForgeConfig, GeneratorConfig, LoaderConfig, SourceConfig};
pub use loader::{DocumentLoader, FileLoader, HttpLoader, SourceLoader};
pub use output::{DocumentSummary, GenerationManifest};
