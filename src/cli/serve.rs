//! Serve command - start the price service

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Settings;
use crate::pipeline::FetchPipeline;
use crate::scheduler::{run_refresh_loop, Schedule, ScheduleExpression};
use crate::server::{router, AppState};
use crate::source::{HttpPageSource, PageSource};
use crate::storage::{MemoryPriceStore, PriceRepository, PriceStore};

/// Arguments for the serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address for the API (overrides configuration)
    #[arg(long)]
    pub bind: Option<String>,

    /// Keep records in memory instead of Postgres
    #[arg(long)]
    pub memory_store: bool,

    /// Disable the in-process refresh loop even if configured on
    #[arg(long)]
    pub no_scheduler: bool,
}

/// Execute the serve command
pub async fn execute(args: ServeArgs) -> Result<()> {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("failed to load configuration ({}), using defaults", e);
            Settings::default_settings()
        }
    };

    let bind = args.bind.unwrap_or_else(|| settings.server.bind.clone());

    info!("Starting gold tracker service");
    info!("  Source: {}", settings.source.url);
    info!("  Bind address: {}", bind);
    info!("  Memory store: {}", args.memory_store);

    let store: Arc<dyn PriceStore> = if args.memory_store {
        Arc::new(MemoryPriceStore::new())
    } else {
        info!("Connecting to database...");
        let repository = PriceRepository::from_settings(&settings.database).await?;
        repository.run_migrations().await?;
        info!("Database connected and migrations applied");
        Arc::new(repository)
    };

    let source: Arc<dyn PageSource> = Arc::new(HttpPageSource::from_settings(&settings.source)?);
    let pipeline = Arc::new(FetchPipeline::new(
        source,
        store.clone(),
        &settings.pipeline,
    ));

    // Shutdown broadcast: Ctrl+C fans out to the refresh loop and the server
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = ctrl_c_tx.send(());
        }
    });

    if settings.scheduler.enabled && !args.no_scheduler {
        info!(
            "  Refresh interval: {}s",
            settings.scheduler.interval_secs
        );
        let schedule = Schedule::new(
            "price-refresh",
            ScheduleExpression::EverySeconds(settings.scheduler.interval_secs),
        );
        tokio::spawn(run_refresh_loop(
            pipeline.clone(),
            schedule,
            shutdown_tx.subscribe(),
        ));
    }

    let state = AppState {
        pipeline,
        store,
    };

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!("API listening on {}", bind);

    let mut shutdown_rx = shutdown_tx.subscribe();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .context("server error")?;

    info!("Service stopped");
    Ok(())
}
