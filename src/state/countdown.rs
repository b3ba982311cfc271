//! Countdown evaluation for timed events such as exams.
//!
//! The evaluator is a pure function of `(start_at, now)`; re-evaluation on a
//! fixed period is the job of [`crate::state::ticker::CountdownTicker`].

use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Display value reported once the event has started.
pub const STARTED_DISPLAY: &str = "STARTED";

const MS_PER_SECOND: i128 = 1_000;
const SECONDS_PER_MINUTE: i128 = 60;
const SECONDS_PER_HOUR: i128 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i128 = 24 * SECONDS_PER_HOUR;

/// Coarse state of a timed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Phase {
    /// The start time has not been reached yet.
    Pending,
    /// The start time has been reached or passed.
    Started,
}

/// Result of evaluating a countdown at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Countdown {
    pub phase: Phase,
    /// Whole days remaining.
    pub days: i64,
    /// Whole hours remaining after removing the days.
    pub hours: i64,
    /// Whole minutes remaining after removing the hours.
    pub minutes: i64,
    /// Whole seconds remaining after removing the minutes.
    pub seconds: i64,
    /// Human readable remaining time. Only the days are shown while at least
    /// one day remains.
    pub display: String,
}

impl Countdown {
    fn started() -> Self {
        Self {
            phase: Phase::Started,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            display: STARTED_DISPLAY.to_string(),
        }
    }

    /// Whether the event has started.
    pub fn is_started(&self) -> bool {
        self.phase == Phase::Started
    }
}

/// Evaluate the countdown towards `start_at` as observed at `now`.
pub fn evaluate(start_at: OffsetDateTime, now: OffsetDateTime) -> Countdown {
    let diff_ms = (start_at - now).whole_milliseconds();
    if diff_ms <= 0 {
        return Countdown::started();
    }

    let total_seconds = diff_ms / MS_PER_SECOND;
    let days = total_seconds / SECONDS_PER_DAY;
    let hours = (total_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;

    let display = if days > 0 {
        format!("{days}days ")
    } else {
        format!("{hours}H {minutes}M {seconds}S")
    };

    Countdown {
        phase: Phase::Pending,
        days: days as i64,
        hours: hours as i64,
        minutes: minutes as i64,
        seconds: seconds as i64,
        display,
    }
}
