//! Controllable clock for testing.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Clock that stands still until advanced.
///
/// Clones share the same time, so a test can keep one handle and move
/// time forward under a token operator holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a clock frozen at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += by;
    }
}

impl Default for MockClock {
    /// Frozen at 2025-01-01 00:00:00 UTC.
    fn default() -> Self {
        Self::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
