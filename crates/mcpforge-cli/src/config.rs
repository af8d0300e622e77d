//! Configuration management for mcpforge
//!
//! Loads configuration with priority:
//! 1. Command-line flags
//! 2. mcpforge.toml (or the file given with `--config`)
//! 3. Defaults
//!
//! String values of the form `${VAR}` are read from the environment, after
//! `.env` has been loaded by the binary.

use crate::cli::GenerateArgs;
use anyhow::{Context, Result};
use mcpforge_core::CollisionPolicy;
use mcpforge_telemetry::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the file searched for in the current directory and its parents.
pub const CONFIG_FILE_NAME: &str = "mcpforge.toml";

/// mcpforge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Documents processed by `generate` when none are given on the command line
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// `[generator]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Base URL override (can reference env var with ${VAR_NAME})
    pub base_url: Option<String>,

    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub collision: CollisionPolicy,
}

/// `[loader]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// One `[[sources]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File path or http(s) URL
    pub location: String,

    /// Label used in logs and the manifest (default: the location)
    pub name: Option<String>,
}

impl SourceConfig {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            base_url: None,
            strict: false,
            workers: default_workers(),
            collision: CollisionPolicy::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ForgeConfig {
    /// Load the configuration file, or defaults when there is none.
    ///
    /// An explicitly given path must exist; the searched-for file may not.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::find_config_file()? {
                Some(found) => found,
                None => {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        // Relative source paths are relative to the config file.
        if let Some(dir) = config_path.parent() {
            config.anchor_sources(dir);
        }

        Ok(config)
    }

    /// Parse TOML text and resolve `${VAR}` references.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: ForgeConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Find mcpforge.toml by searching current directory and parents
    fn find_config_file() -> Result<Option<PathBuf>> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        // An unset variable means no override rather than a literal "${...}".
        self.generator.base_url = self
            .generator
            .base_url
            .as_deref()
            .and_then(Self::resolve_env_var)
            .filter(|url| !url.is_empty());

        for source in &mut self.sources {
            if let Some(resolved) = Self::resolve_env_var(&source.location) {
                source.location = resolved;
            }
        }

        if let Some(level) = Self::resolve_env_var(&self.logging.level) {
            self.logging.level = level;
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    fn anchor_sources(&mut self, dir: &Path) {
        for source in &mut self.sources {
            let is_url = source.location.starts_with("http://") || source.location.starts_with("https://");
            if !is_url && Path::new(&source.location).is_relative() {
                source.location = dir.join(&source.location).to_string_lossy().into_owned();
            }
        }
    }

    /// Apply `generate` flags on top of the file values.
    pub fn apply_generate_args(&mut self, args: &GenerateArgs) {
        if !args.sources.is_empty() {
            self.sources = args.sources.iter().map(SourceConfig::new).collect();
        }
        if let Some(output) = &args.output {
            self.generator.output = output.clone();
        }
        if let Some(base_url) = &args.base_url {
            self.generator.base_url = Some(base_url.clone());
        }
        if args.strict {
            self.generator.strict = true;
        }
        if let Some(workers) = args.workers {
            self.generator.workers = workers;
        }
        if let Some(collision) = args.collision {
            self.generator.collision = collision;
        }
        self.generator.workers = self.generator.workers.max(1);
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("mcpforge-tools.json")
}

fn default_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}
