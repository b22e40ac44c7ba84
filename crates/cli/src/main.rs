//! AgentQuest CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write a default config and a sample player roster
//! - `generate`  — Generate and validate a world from a seed
//! - `play`      — Play rounds against a generated world
//! - `serve`     — Start the HTTP API server
//! - `status`    — Show configuration and saved artifacts

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "agentquest",
    about = "AgentQuest — LLM agent crews that build worlds and run the game",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and a sample player roster
    Onboard,

    /// Generate a world from a seed
    Generate {
        /// Free-text description of the world
        #[arg(short, long)]
        seed: String,

        /// Directory to write world_state.json into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum generation attempts
        #[arg(long)]
        max_iterations: Option<u32>,
    },

    /// Play a game session
    Play {
        /// Path to world_state.json
        #[arg(short, long)]
        world: Option<PathBuf>,

        /// Player roster (TOML or JSON)
        #[arg(short, long)]
        players: Option<PathBuf>,

        /// Session directory (game_state.json, transcript.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many rounds
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Start over instead of resuming a saved game
        #[arg(long)]
        fresh: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and saved artifacts
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Generate {
            seed,
            output,
            max_iterations,
        } => commands::generate::run(seed, output, max_iterations).await?,
        Commands::Play {
            world,
            players,
            output,
            rounds,
            fresh,
        } => {
            commands::play::run(commands::play::PlayArgs {
                world,
                players,
                output,
                rounds,
                fresh,
            })
            .await?
        }
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
