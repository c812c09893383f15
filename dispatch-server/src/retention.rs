//! Recycle bin retention
//!
//! Background task that permanently removes binned records once they have
//! been in the bin longer than the configured retention window.

use std::time::Duration;

use dispatch_common::config::ServiceSettings;
use dispatch_common::time;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::db::scans;

/// Run one purge pass, returning the number of records removed
pub async fn purge_once(db: &SqlitePool, settings: &ServiceSettings) -> dispatch_common::Result<u64> {
    let purged = scans::purge_expired(db, settings.bin_retention_days, time::now()).await?;
    if purged > 0 {
        info!(
            purged,
            retention_days = settings.bin_retention_days,
            "Purged expired recycle bin entries"
        );
    } else {
        debug!("No expired recycle bin entries");
    }
    Ok(purged)
}

/// Spawn the periodic purge loop. The first pass runs immediately.
pub fn spawn_purge_task(db: SqlitePool, settings: ServiceSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(settings.purge_interval_secs.max(1)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tick.tick().await;
            if let Err(e) = purge_once(&db, &settings).await {
                // Retry on the next tick
                warn!("Recycle bin purge failed: {}", e);
            }
        }
    })
}
