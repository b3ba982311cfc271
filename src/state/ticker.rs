use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::debug;

use crate::state::countdown::{Countdown, evaluate};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Periodically re-evaluates a countdown until the event has started.
///
/// The background task is aborted when the ticker is dropped, so whoever owns
/// the ticker (typically one SSE connection) bounds its lifetime.
pub struct CountdownTicker {
    handle: JoinHandle<()>,
    updates: watch::Receiver<Countdown>,
}

impl CountdownTicker {
    /// Evaluate immediately, then every `period` while the countdown is pending.
    pub fn spawn(start_at: OffsetDateTime, period: Duration, clock: Arc<dyn Clock>) -> Self {
        let initial = evaluate(start_at, clock.now());
        let already_started = initial.is_started();
        let (tx, updates) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            if already_started {
                return;
            }

            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately and the initial value is already published.
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let countdown = evaluate(start_at, clock.now());
                let started = countdown.is_started();
                if tx.send(countdown).is_err() {
                    break;
                }
                if started {
                    debug!(%start_at, "countdown reached start; ticker stopping");
                    break;
                }
            }
        });

        Self { handle, updates }
    }

    /// Subscribe to countdown updates. The current value is marked as unseen.
    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        let mut receiver = self.updates.clone();
        receiver.mark_changed();
        receiver
    }

    /// Latest evaluated countdown.
    pub fn current(&self) -> Countdown {
        self.updates.borrow().clone()
    }

    /// Whether the background task is still re-evaluating.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::countdown::Phase;
    use std::sync::Mutex;
    use time::macros::datetime;

    /// Clock whose time only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<OffsetDateTime>,
    }

    impl ManualClock {
        pub(crate) fn new(now: OffsetDateTime) -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(now),
            })
        }

        pub(crate) fn advance(&self, by: time::Duration) {
            let mut guard = self.now.lock().unwrap();
            *guard += by;
        }

        pub(crate) fn set(&self, at: OffsetDateTime) {
            *self.now.lock().unwrap() = at;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

    const START: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

    #[tokio::test(start_paused = true)]
    async fn publishes_updates_until_started_then_stops() {
        let clock = ManualClock::new(START - time::Duration::seconds(2));
        let ticker = CountdownTicker::spawn(START, Duration::from_secs(1), clock.clone());
        let mut updates = ticker.subscribe();

        let first = updates.borrow_and_update().clone();
        assert_eq!(first.display, "0H 0M 2S");

        clock.advance(time::Duration::seconds(1));
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().display, "0H 0M 1S");

        clock.advance(time::Duration::seconds(1));
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().phase, Phase::Started);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn never_reports_pending_after_started_even_if_clock_goes_back() {
        let clock = ManualClock::new(START);
        let ticker = CountdownTicker::spawn(START, Duration::from_secs(1), clock.clone());
        assert!(ticker.current().is_started());

        clock.set(START - time::Duration::hours(1));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(ticker.current().is_started());
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_cancels_the_task() {
        let clock = ManualClock::new(START - time::Duration::days(2));
        let ticker = CountdownTicker::spawn(START, Duration::from_secs(1), clock);
        let mut updates = ticker.subscribe();
        assert!(ticker.is_running());

        drop(ticker);
        updates.borrow_and_update();
        assert!(updates.changed().await.is_err());
    }
}
