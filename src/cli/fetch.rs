//! Fetch command - run one fetch cycle on-demand

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::pipeline::FetchPipeline;
use crate::server::report_body;
use crate::source::{HttpPageSource, PageSource};
use crate::storage::{MemoryPriceStore, PriceRepository, PriceStore};

/// Arguments for the fetch command
#[derive(Args)]
pub struct FetchArgs {
    /// Fetch and report without touching the database
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full cycle report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the fetch command
pub async fn execute(args: FetchArgs) -> Result<()> {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("failed to load configuration ({}), using defaults", e);
            Settings::default_settings()
        }
    };

    let store: Arc<dyn PriceStore> = if args.dry_run {
        info!("Dry run: records stay in memory");
        Arc::new(MemoryPriceStore::new())
    } else {
        let repository = PriceRepository::from_settings(&settings.database).await?;
        repository.run_migrations().await?;
        Arc::new(repository)
    };

    let source: Arc<dyn PageSource> = Arc::new(HttpPageSource::from_settings(&settings.source)?);
    let pipeline = FetchPipeline::new(source, store, &settings.pipeline);

    let report = pipeline.run_cycle().await?;

    info!("Fetch cycle completed");
    info!("  Update time: {}", report.display_time);
    info!("  Rows extracted: {}", report.snapshot.len());
    match report.outcome.reason() {
        None => info!("  Outcome: saved"),
        Some(reason) => info!("  Outcome: not saved ({})", reason),
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_body(&report))?);
    }

    Ok(())
}
