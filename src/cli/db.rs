//! Database management commands

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::config::Settings;
use crate::storage::PriceRepository;

/// Database subcommands
#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
    /// Show database statistics
    Stats,
}

/// Execute database commands
pub async fn execute(cmd: DbCommands) -> Result<()> {
    match cmd {
        DbCommands::Migrate => execute_migrate().await,
        DbCommands::Stats => execute_stats().await,
    }
}

async fn execute_migrate() -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = PriceRepository::from_settings(&settings.database).await?;

    repository.run_migrations().await?;

    info!("Migrations completed");
    Ok(())
}

async fn execute_stats() -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = PriceRepository::from_settings(&settings.database).await?;

    info!("Fetching database statistics...");
    let stats = repository.stats().await?;

    info!("Database Statistics:");
    info!("  Total records: {}", stats.total_records);
    if let Some(earliest) = stats.earliest {
        info!("  Earliest record: {}", earliest);
    }
    if let Some(latest) = stats.latest {
        info!("  Latest record: {}", latest);
    }

    Ok(())
}
