//! Run-level errors. Per-item failures never show up here; they are
//! `DownloadOutcome::Failed` entries on the job record.

use std::path::PathBuf;

use crate::retry::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid identity {0:?}: no characters left after sanitizing")]
    InvalidIdentity(String),

    #[error("an archive run for {0} is already in progress")]
    AlreadyRunning(String),

    #[error("failed to fetch library: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("job registry: {0:#}")]
    Registry(anyhow::Error),

    #[error("download workers: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ArchiveError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True when the remote rejected the credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, ArchiveError::Fetch(FetchError::Auth(_)))
    }
}
