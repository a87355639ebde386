//! Petpal CLI
//!
//! Entry point for the Petpal AI chat: ask questions, train the knowledge
//! index from the platform database and serve the chat endpoint.

mod commands;
mod runtime;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ClearCommand, ServeCommand, StatsCommand, TrainCommand};
use petpal_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Petpal AI - retrieval-augmented chat over pet adoption data
#[derive(Parser, Debug)]
#[command(name = "petpal")]
#[command(about = "Retrieval-augmented chat over Petpal posts and foundations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PETPAL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: .petpal/config.yaml)
    #[arg(short, long, global = true, env = "PETPAL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask Petpal AI a question
    Ask(AskCommand),

    /// Ingest platform data into the knowledge index
    Train(TrainCommand),

    /// Clear all knowledge
    Clear(ClearCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Run the HTTP server
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?
        .with_overrides(
            cli.workspace,
            cli.config,
            cli.log_level,
            cli.verbose,
            cli.no_color,
        );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate().context("Invalid configuration")?;

    tracing::info!("Petpal CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("LLM: {} / {}", config.llm.provider, config.llm.model);

    config.ensure_petpal_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Train(_) => "train",
        Commands::Clear(_) => "clear",
        Commands::Stats(_) => "stats",
        Commands::Serve(_) => "serve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Train(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("petpal {} failed", command_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_train_flags() {
        let cli = Cli::try_parse_from([
            "petpal", "train", "--reset", "--batch-size", "3", "--delay", "5", "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Train(cmd) => {
                assert!(cmd.reset);
                assert_eq!(cmd.batch_size, Some(3));
                assert_eq!(cmd.delay, Some(5));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from(["petpal", "ask", "หาบ้านให้แมวสีส้ม", "--verbose"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask(cmd) => assert_eq!(cmd.message, "หาบ้านให้แมวสีส้ม"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
