// Periodic refresh: once shortly after startup, then on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{RefreshConfig, MAX_INITIAL_DELAY_SECS, MAX_INTERVAL_HOURS};
use crate::service::RankingService;

/// Delay before the first refresh and the period between later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub initial_delay: Duration,
    pub interval: Duration,
}

const SECS_PER_HOUR: u64 = 60 * 60;

/// Values outside the validated ranges are clamped into them, so the
/// interval is never zero and deadline arithmetic cannot overflow.
impl From<&RefreshConfig> for Schedule {
    fn from(config: &RefreshConfig) -> Self {
        let hours = config.interval_hours.clamp(1, MAX_INTERVAL_HOURS);
        Schedule {
            initial_delay: Duration::from_secs(
                config.initial_delay_secs.min(MAX_INITIAL_DELAY_SECS),
            ),
            interval: Duration::from_secs(hours.saturating_mul(SECS_PER_HOUR)),
        }
    }
}

/// Spawn the refresh loop. It runs until the handle is aborted.
pub fn spawn(service: Arc<RankingService>, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(run(service, schedule))
}

/// Failed refreshes are logged and the loop keeps its cadence.
pub async fn run(service: Arc<RankingService>, schedule: Schedule) {
    info!(
        "Refresh scheduled in {:?}, then every {:?}",
        schedule.initial_delay, schedule.interval
    );
    tokio::time::sleep(schedule.initial_delay).await;

    let mut ticker = tokio::time::interval(schedule.interval);
    loop {
        // The first tick completes immediately.
        ticker.tick().await;
        match service.refresh().await {
            Ok(summary) => info!(
                "Scheduled refresh done: {} pitchers, {} hitters",
                summary.pitchers, summary.hitters
            ),
            Err(e) => warn!("Scheduled refresh failed; keeping previous rankings: {}", e),
        }
    }
}
