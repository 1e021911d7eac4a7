//! Gold Tracker CLI
//!
//! Provides commands for:
//! - `serve`: Start the price service
//! - `fetch`: Run one fetch cycle on-demand
//! - `db`: Database operations

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gold_tracker::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("gold_tracker=info".parse()?))
        .init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Serve(args) => {
            gold_tracker::cli::serve::execute(args).await?;
        }
        Commands::Fetch(args) => {
            gold_tracker::cli::fetch::execute(args).await?;
        }
        Commands::Db(cmd) => {
            gold_tracker::cli::db::execute(cmd).await?;
        }
    }

    Ok(())
}
