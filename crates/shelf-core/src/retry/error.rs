//! Remote fetch error taxonomy used for retry classification.

/// Error returned by a single remote call (catalog or asset).
/// Kept separate from `ArchiveError` so the retry loop can classify it before
/// it reaches the run level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The remote rejected the credential (HTTP 401/403). Never retried.
    #[error("credential rejected (HTTP {0})")]
    Auth(u32),
    /// Any other non-2xx status. Never retried.
    #[error("HTTP {0}")]
    Remote(u32),
    /// The request could not be built or the body could not be understood
    /// (bad URL, catalog that is not JSON). Never retried.
    #[error("malformed: {0}")]
    Malformed(String),
    /// Network-level failure (connect, DNS, reset, timeout). Retried with backoff.
    #[error("transport: {0}")]
    Transport(String),
}

impl FetchError {
    /// Map a curl failure: URL problems are `Malformed`, everything else is transport.
    pub fn from_curl(e: curl::Error) -> Self {
        if e.is_url_malformed() || e.is_unsupported_protocol() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
