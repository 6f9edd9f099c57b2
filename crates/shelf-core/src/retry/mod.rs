//! Retry and backoff policy.
//!
//! This module encapsulates error classification (rejected credential,
//! remote failure status, network failure) and exponential backoff decisions
//! so that the catalog fetch and every asset fetch share one policy. Only
//! network-level failures are retried; the loop is bounded by
//! `RetryPolicy::max_attempts`.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryNotice};
