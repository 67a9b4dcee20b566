//! System clock adapter

use chrono::{DateTime, Utc};
use portcullis_application::ports::Clock;

/// Wall-clock time source for token expiry checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_track_seconds() {
        let clock = SystemClock::new();
        let millis = clock.now_millis();
        let secs = clock.now().timestamp();
        assert!(millis > 0);
        assert!((millis / 1000 - secs).abs() <= 1);
    }
}
