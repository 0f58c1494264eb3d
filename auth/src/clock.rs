//! Time source.
//!
//! Token expiry is always checked against an injected [`Clock`] so tests
//! can move time forward without sleeping.

use chrono::{DateTime, Utc};

/// Clock trait for time operations.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use marketplace_auth::clock::Clock;
///
/// struct FixedClock { time: DateTime<Utc> }
/// impl Clock for FixedClock {
///     fn now(&self) -> DateTime<Utc> {
///         self.time
///     }
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
