//! Runelore: grounded OSRS question answering from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "runelore",
    version,
    about = "Answers OSRS questions grounded in the official wiki via a local Ollama"
)]
struct Cli {
    /// Path to a TOML config file (env vars override its values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer questions interactively
    Run,
    /// Probe the completion service, cache backend, and wiki API
    Check,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = runelore_config::AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run => commands::run::execute(config).await,
        Command::Check => commands::check::execute(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
