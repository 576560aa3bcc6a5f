use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// A capture instant carried on two clocks.
///
/// `instant` is monotonic and drives every duration comparison (confirmation
/// delay, cooldown). `wall` is the local wall-clock time recorded in the
/// event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

impl Timestamp {
    pub fn new(instant: Instant, wall: DateTime<Local>) -> Self {
        Self { instant, wall }
    }

    pub fn now() -> Self {
        Self::new(Instant::now(), Local::now())
    }

    /// Returns the timestamp `offset` later on both clocks.
    pub fn after(&self, offset: Duration) -> Self {
        let micros = i64::try_from(offset.as_micros()).unwrap_or(i64::MAX);
        Self {
            instant: self.instant + offset,
            wall: self.wall + chrono::Duration::microseconds(micros),
        }
    }

    /// Monotonic time elapsed since `earlier`, saturating at zero.
    pub fn since(&self, earlier: Instant) -> Duration {
        self.instant.saturating_duration_since(earlier)
    }
}
