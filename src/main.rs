mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "grnsync")]
#[command(about = "Sync your Garoon schedule into Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync Garoon events in the window into Google Calendar
    Sync {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Authorize access to Google Calendar
    Auth,
    /// Print the config file path, creating a template if needed
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { dry_run } => commands::sync::run(dry_run).await,
        Commands::Auth => commands::auth::run().await,
        Commands::Config => commands::config::run(),
    }
}
