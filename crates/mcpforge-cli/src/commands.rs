use crate::batch::BatchRunner;
use crate::cli::GenerateArgs;
use crate::config::{ForgeConfig, SourceConfig};
use crate::loader::{DocumentLoader, SourceLoader};
use crate::output::{DocumentSummary, GenerationManifest};
use anyhow::{Context, Result, bail};
use mcpforge_core::{ForgeError, SynthesisOptions, merge_tool_sets, normalize, validate};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What `generate` produced, before anything is written.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub manifest: GenerationManifest,
    /// Sources that could not be processed at all
    pub failed: Vec<String>,
}

/// Run `generate`: process every source, merge the tools and write the manifest.
///
/// Exits with failure when any document could not be processed; the
/// manifest still lists the documents that worked.
pub async fn run_generate(mut config: ForgeConfig, args: &GenerateArgs) -> Result<ExitCode> {
    config.apply_generate_args(args);
    let loader = Arc::new(SourceLoader::new(Duration::from_secs(config.loader.timeout_secs))?);

    let outcome = generate(&config, loader).await?;
    outcome.manifest.write_to(&config.generator.output).await?;

    info!(
        "Wrote {} tools from {} documents to {:?}",
        outcome.manifest.tools.len(),
        outcome.manifest.documents.len(),
        config.generator.output
    );

    if outcome.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} document(s) failed: {}", outcome.failed.len(), outcome.failed.join(", "));
        Ok(ExitCode::FAILURE)
    }
}

/// Process the configured sources with the given loader.
pub async fn generate(config: &ForgeConfig, loader: Arc<dyn DocumentLoader>) -> Result<GenerateOutcome> {
    if config.sources.is_empty() {
        bail!("No sources given. Pass document paths or URLs, or add [[sources]] to mcpforge.toml");
    }

    let options = SynthesisOptions {
        base_url_override: config.generator.base_url.clone(),
    };
    let runner = BatchRunner::new(loader, options, config.generator.workers);
    let results = runner.run(config.sources.clone()).await;

    let documents: Vec<DocumentSummary> = results.iter().map(DocumentSummary::from_result).collect();
    let failed = documents
        .iter()
        .filter(|d| d.failed())
        .map(|d| d.source.clone())
        .collect();

    if config.generator.strict {
        let errors: Vec<String> = documents
            .iter()
            .filter_map(|d| d.validation.as_ref().map(|v| (d, v)))
            .flat_map(|(d, v)| v.errors.iter().map(move |e| format!("{}: {}", d.source, e)))
            .collect();
        if !errors.is_empty() {
            return Err(ForgeError::Validation { errors }).context("Strict mode: refusing to generate");
        }
    }

    let outputs: Vec<_> = results.into_iter().filter_map(|r| r.outcome.ok()).collect();
    let tools = merge_tool_sets(&outputs, config.generator.collision)?;

    Ok(GenerateOutcome {
        manifest: GenerationManifest { documents, tools },
        failed,
    })
}

/// Run `validate`: print the report of one document as JSON.
pub async fn run_validate(config: &ForgeConfig, source: &str) -> Result<ExitCode> {
    let loader = SourceLoader::new(Duration::from_secs(config.loader.timeout_secs))?;
    let source = SourceConfig::new(source);
    let document = loader.load_document(&source.location).await?;
    let spec = normalize(&document).with_context(|| format!("Cannot validate {}", source.display_name()))?;

    let report = validate(&spec);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_valid {
        info!("{} is valid", source.display_name());
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} has {} error(s)", source.display_name(), report.errors.len());
        Ok(ExitCode::FAILURE)
    }
}
