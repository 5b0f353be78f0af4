//! Hint Control - CLI client for the hint daemon
//!
//! Asks questions and triggers captures over hintd's HTTP API.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use client::HintdClient;
use hint_shared::{HintError, DEFAULT_DAEMON_URL, VERSION};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "hintctl")]
#[command(about = "Game hint assistant - ask about the game on screen", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Daemon base URL
    #[arg(long, env = "HINTD_URL", default_value = DEFAULT_DAEMON_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about the current game
    Ask {
        /// Question text
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Take a screenshot now
    Capture,

    /// Show capture and game status
    Status,

    /// Check that the daemon is up
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), HintError> {
    let client = HintdClient::new(&cli.url)?;

    match cli.command {
        Commands::Ask { query } => commands::ask(&client, &query).await,
        Commands::Capture => commands::capture(&client).await,
        Commands::Status => commands::status(&client).await,
        Commands::Health => commands::health(&client).await,
    }
}
