//! Background sync on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::application::services::{SharedSyncService, SyncTrigger};

/// Runs a scheduled sync every `period` until the task is dropped.
///
/// The first run happens one full period after start. Runs that fail are
/// logged; the next tick tries again.
pub async fn run_sync_scheduler(sync_service: Arc<SharedSyncService>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!(interval_secs = period.as_secs(), "Sync scheduler started");

    loop {
        ticker.tick().await;
        match sync_service.run(SyncTrigger::Scheduled, None).await {
            Ok(report) if report.success => {
                info!(applied = report.applied_count, "Scheduled sync completed");
            }
            Ok(report) => {
                error!(
                    applied = report.applied_count,
                    failed = report.errors.len(),
                    "Scheduled sync completed with errors"
                );
            }
            Err(e) => error!(error = %e, "Scheduled sync failed"),
        }
    }
}
