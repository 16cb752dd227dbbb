//! Time source for entity timestamps.
//!
//! Timestamps are ISO-8601 UTC strings with millisecond precision and a `Z`
//! suffix, e.g. `2024-05-01T12:00:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use std::cell::Cell;

/// Source of the current time for store mutations.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current time formatted as a stored timestamp.
    fn now_iso(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances by a fixed step on every read.
///
/// Intended for tests that assert timestamp propagation.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next_ms: Cell<i64>,
    step_ms: i64,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step_ms: i64) -> Self {
        Self {
            next_ms: Cell::new(start.timestamp_millis()),
            step_ms,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let current = self.next_ms.get();
        self.next_ms.set(current + self.step_ms);
        DateTime::from_timestamp_millis(current).unwrap_or_default()
    }
}

/// Formats a timestamp the way it is persisted.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
