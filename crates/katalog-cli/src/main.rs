//! Katalog CLI - Command-line interface for the book catalog
//!
//! Lists, filters and edits books through the same caches the other front
//! ends use, so an unreachable service still shows the last known catalog.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::books::run_books;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::lookups::run_lookups;
use crate::commands::status::run_status;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "katalog=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Books { command } => run_books(command, profile).await?,
        Commands::Status { command } => run_status(command, profile).await?,
        Commands::Lookups { kind, json } => run_lookups(kind, json, profile).await?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile)?,
    }

    Ok(())
}
