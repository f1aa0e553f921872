//! Somnia command-line tool.
//!
//! Generates sleep stories against a local Ollama server, lists presets and
//! validates configuration files.

use clap::Parser;
use somnia::cli::{Cli, Commands, handle_check_config, handle_generate, handle_presets};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so the story can be piped from stdout.
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Generate(args) => handle_generate(args).await?,
        Commands::Presets => handle_presets(&mut std::io::stdout().lock())?,
        Commands::CheckConfig { path } => {
            handle_check_config(&path, &mut std::io::stdout().lock())?;
        }
    }

    Ok(())
}
