//! Background reminder loop. One pass per tick; failures are logged and the next tick retries.

use std::time::Duration;

use chrono::Utc;
use platform_db::DbPool;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, error, info};

pub async fn run_reminders(db: DbPool, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = every.as_secs(), "reminder worker started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match crm::reminders::run_reminder_pass(&db, Utc::now().fixed_offset()).await {
                    Ok(0) => debug!("no reminders due"),
                    Ok(sent) => info!(sent, "reminder pass finished"),
                    Err(err) => error!(error = %err, "reminder pass failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("reminder worker stopped");
}
