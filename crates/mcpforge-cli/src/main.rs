use clap::Parser;
use mcpforge_cli::{Cli, Commands, ForgeConfig, run_generate, run_validate};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = ForgeConfig::load_from(cli.config.as_deref())?;

    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    mcpforge_telemetry::init_telemetry(&config.logging)?;

    match cli.command {
        Commands::Generate(args) => run_generate(config, &args).await,
        Commands::Validate { source } => run_validate(&config, &source).await,
    }
}
