//! Refresh loop driving the pipeline

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::Schedule;
use crate::pipeline::FetchPipeline;

/// Drive fetch cycles on the given schedule until shutdown.
///
/// The schedule is polled once a second; cycles run inline, so a slow
/// upstream naturally delays the next tick instead of stacking cycles.
pub async fn run_refresh_loop(
    pipeline: Arc<FetchPipeline>,
    mut schedule: Schedule,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(schedule = %schedule.name, "price refresh loop started");
    let mut tick = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if !schedule.should_run() {
                    continue;
                }
                schedule.mark_run();
                match pipeline.run_cycle().await {
                    Ok(report) => {
                        info!(outcome = ?report.outcome, "scheduled refresh completed");
                    }
                    Err(e) => {
                        // next tick retries; scraping failures are transient
                        warn!("scheduled refresh failed: {}", e);
                    }
                }
            }
            _ = shutdown.recv() => {
                info!("price refresh loop stopping");
                break;
            }
        }
    }
}
