//! Retry loop: run a closure until success or policy says stop.

use std::time::Duration;

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Passed to the observer before each backoff sleep.
#[derive(Debug)]
pub struct RetryNotice<'a> {
    /// Attempt that just failed (1-based).
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a FetchError,
}

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, calls `on_retry`, sleeps for the backoff duration, then tries again.
/// Blocks the calling thread; use from worker threads or `spawn_blocking`.
pub fn run_with_retry<T, F, O>(policy: &RetryPolicy, mut f: F, mut on_retry: O) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
    O: FnMut(&RetryNotice<'_>),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        on_retry(&RetryNotice {
                            attempt,
                            max_attempts: policy.max_attempts,
                            delay: d,
                            error: &e,
                        });
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
