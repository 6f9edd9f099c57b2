//! Authenticated access to the remote catalog/asset service.
//!
//! `RemoteClient` is the raw transport seam (one attempt per call);
//! `Fetcher` binds a client to a credential and the retry policy.

mod curl_client;

use std::sync::Arc;

use crate::catalog::RawCatalog;
use crate::retry::{run_with_retry, FetchError, RetryNotice, RetryPolicy};
use crate::run_log::RunLog;

pub use curl_client::CurlClient;

/// One HTTP attempt per call; retries are layered on top by `Fetcher`.
/// Implementations block the calling thread.
pub trait RemoteClient: Send + Sync {
    fn fetch_catalog(&self, credential: &str) -> Result<RawCatalog, FetchError>;
    fn fetch_asset(&self, url: &str, credential: &str) -> Result<Vec<u8>, FetchError>;
}

/// Client + credential + retry policy for one run. Cheap to clone into workers.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn RemoteClient>,
    credential: Arc<str>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Arc<dyn RemoteClient>, credential: &str, policy: RetryPolicy) -> Self {
        Self {
            client,
            credential: Arc::from(credential),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch the catalog, retrying transport failures.
    pub fn catalog(&self, log: &RunLog) -> Result<RawCatalog, FetchError> {
        run_with_retry(
            &self.policy,
            || self.client.fetch_catalog(&self.credential),
            |n| log_retry(log, n),
        )
    }

    /// Fetch one asset, retrying transport failures.
    pub fn asset(&self, url: &str, log: &RunLog) -> Result<Vec<u8>, FetchError> {
        run_with_retry(
            &self.policy,
            || self.client.fetch_asset(url, &self.credential),
            |n| log_retry(log, n),
        )
    }
}

fn log_retry(log: &RunLog, n: &RetryNotice<'_>) {
    log.warn(&format!(
        "Retry {}/{} after {}ms: {}",
        n.attempt,
        n.max_attempts,
        n.delay.as_millis(),
        n.error
    ));
}
