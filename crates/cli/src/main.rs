//! mcpagent CLI.
//!
//! Commands:
//! - `ask`    Answer one question, or chat interactively when none is given
//! - `tools`  List the tools the configured server offers
//! - `config` Show, validate or locate the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mcpagent",
    about = "Tool-calling LLM agent for MCP tool servers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the agent a question
    Ask {
        /// The question; omit for interactive mode
        question: Option<String>,

        /// Print tool activity as it happens
        #[arg(short, long)]
        stream: bool,

        /// Print the answer and tool metadata as JSON
        #[arg(long, conflicts_with = "stream")]
        json: bool,
    },

    /// List discovered tools and their parameters
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Check the configuration for problems
    Validate,
    /// Print the config file location
    Path,
    /// Print a default config file
    Default,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            question,
            stream,
            json,
        } => commands::ask::run(question, stream, json).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Default => commands::config_cmd::default(),
        },
    }

    Ok(())
}
