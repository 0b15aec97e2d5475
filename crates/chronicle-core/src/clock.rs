//! Clock abstraction for determinism.

use chrono::{DateTime, Utc};

/// Abstraction over system time so event creation instants can be pinned in
/// tests and replays.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
