//! Classify HTTP statuses and fetch errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify a non-2xx HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        401 | 403 => ErrorKind::Auth,
        _ => ErrorKind::Remote(code.min(u16::MAX as u32) as u16),
    }
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Auth(_) => ErrorKind::Auth,
        FetchError::Remote(code) => classify_http_status(*code),
        FetchError::Malformed(_) => ErrorKind::Other,
        FetchError::Transport(_) => ErrorKind::Transport,
    }
}
