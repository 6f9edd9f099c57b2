use std::time::Duration;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure (connection reset, DNS, timeout, etc.).
    Transport,
    /// Credential rejected.
    Auth,
    /// Non-success HTTP status other than an auth rejection.
    Remote(u16),
    /// Anything else (bad URL, undecodable body).
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
///
/// Delay after failed attempt `n` (1-based) is `min(base * 2^n, max_delay)`,
/// so with the defaults the waits are 2s, 4s, 8s, 10s, ...
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries (single attempt).
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff delay after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    /// Decide whether to retry after attempt `attempt` (1-based) failed with `kind`.
    /// Returns `RetryDecision::NoRetry` once `max_attempts` is reached.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Transport => RetryDecision::RetryAfter(self.backoff(attempt)),
            ErrorKind::Auth | ErrorKind::Remote(_) | ErrorKind::Other => RetryDecision::NoRetry,
        }
    }
}
