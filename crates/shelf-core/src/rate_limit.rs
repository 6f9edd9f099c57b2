//! Per-worker pacing before asset fetches.
//!
//! Each worker sleeps for a fixed interval before every fetch, whatever the
//! outcome of its previous fetch. This is not a global token bucket: with `C`
//! workers the aggregate rate is roughly `C` requests per interval.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    interval: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// No pacing at all (tests, local mirrors).
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block the calling worker for the configured interval.
    pub fn before_download(&self) {
        if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }
    }
}
