use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::state::SharedState;

/// Period between two sweeps of expired sessions and reset tokens.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drop sessions and reset tokens nobody came back for. Runs forever.
pub async fn run(state: SharedState, period: Duration) {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let removed = state.sessions().purge_expired(Instant::now());
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
    }
}
