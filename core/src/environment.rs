//! Injected environment dependencies that are not domain seams.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Mock session ids and ticket purchase times are derived from it.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
