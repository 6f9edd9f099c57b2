//! One archive run, end to end: load the persisted catalog, fetch the remote
//! one, download what is new, persist the merged catalog.
//!
//! Blocking work (curl, file writes) runs on `spawn_blocking`; the initiating
//! task keeps the job registry updated from the workers' progress channel.

mod progress_loop;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{self, Catalog, CatalogStore};
use crate::config::ArchiveConfig;
use crate::coordinator::DownloadCoordinator;
use crate::error::ArchiveError;
use crate::identity::{ArchivePaths, Identity};
use crate::progress::{ItemError, ProgressSnapshot, ProgressTracker};
use crate::registry::{JobRecord, JobStore};
use crate::remote::{Fetcher, RemoteClient};
use crate::run_log::RunLog;

/// Buffered progress snapshots between workers and the registry updater.
const PROGRESS_CHANNEL_CAP: usize = 64;

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub identity: String,
    /// Assets downloaded in this run.
    pub downloaded: u64,
    /// Length of the merged catalog after this run.
    pub total: usize,
    /// Final counters over the new items of this run.
    pub progress: ProgressSnapshot,
    pub errors: Vec<ItemError>,
}

pub struct ArchiveEngine<S> {
    cfg: ArchiveConfig,
    data_dir: PathBuf,
    client: Arc<dyn RemoteClient>,
    jobs: S,
}

impl<S: JobStore> ArchiveEngine<S> {
    pub fn new(
        cfg: ArchiveConfig,
        data_dir: PathBuf,
        client: Arc<dyn RemoteClient>,
        jobs: S,
    ) -> Self {
        Self {
            cfg,
            data_dir,
            client,
            jobs,
        }
    }

    pub fn jobs(&self) -> &S {
        &self.jobs
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run one archive for `identity` using `credential` for every remote call.
    pub async fn run_archive(
        &self,
        identity: &str,
        credential: &str,
    ) -> Result<ArchiveSummary, ArchiveError> {
        self.run_archive_with_progress(identity, credential, None)
            .await
    }

    /// Like [`run_archive`](Self::run_archive); every progress snapshot is also
    /// forwarded to `progress_tx` (`try_send`, so a slow consumer misses updates).
    pub async fn run_archive_with_progress(
        &self,
        identity: &str,
        credential: &str,
        progress_tx: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>,
    ) -> Result<ArchiveSummary, ArchiveError> {
        let identity = Identity::parse(identity)?;
        let id = identity.as_str();

        if let Some(job) = self.jobs.get(id).await.map_err(ArchiveError::Registry)? {
            if job.is_running() {
                return Err(ArchiveError::AlreadyRunning(id.to_string()));
            }
        }
        self.jobs.create(id).await.map_err(ArchiveError::Registry)?;
        tracing::info!(identity = id, "archive run started");

        let paths = ArchivePaths::new(&self.data_dir, &identity);
        if let Err(e) = paths.ensure() {
            let err = ArchiveError::persistence(&paths.base, e);
            self.record_failure(id, &err).await;
            return Err(err);
        }
        let log = Arc::new(RunLog::init(&paths.logs, id));

        match self.execute(&identity, &paths, &log, credential, progress_tx).await {
            Ok(summary) => {
                tracing::info!(
                    identity = id,
                    downloaded = summary.downloaded,
                    total = summary.total,
                    "archive run completed"
                );
                Ok(summary)
            }
            Err(err) => {
                log.error(&format!("Archive failed: {}", err));
                self.record_failure(id, &err).await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        identity: &Identity,
        paths: &ArchivePaths,
        log: &Arc<RunLog>,
        credential: &str,
        progress_tx: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>,
    ) -> Result<ArchiveSummary, ArchiveError> {
        let id = identity.as_str();
        let store = CatalogStore::new(&paths.catalog);
        let existing = store.load();
        log.info(&format!("Loaded {} existing items", existing.len()));

        let fetcher = Fetcher::new(Arc::clone(&self.client), credential, self.cfg.retry_policy());
        let remote = {
            let fetcher = fetcher.clone();
            let log = Arc::clone(log);
            tokio::task::spawn_blocking(move || fetcher.catalog(&log)).await??
        };
        log.info(&format!("Found {} total items", remote.items.len()));

        let new_items = catalog::diff(&existing, &remote.items);
        log.info(&format!("{} new items to download", new_items.len()));

        let tracker = Arc::new(ProgressTracker::new(new_items.len() as u64));
        self.jobs
            .update_progress(id, &tracker.snapshot())
            .await
            .map_err(ArchiveError::Registry)?;

        let coordinator = Arc::new(DownloadCoordinator::new(
            fetcher,
            self.cfg.rate_limiter(),
            paths.downloads.clone(),
            self.cfg.asset_extension.clone(),
            self.cfg.concurrency,
            Arc::clone(log),
        ));
        let (tx, rx) = tokio::sync::mpsc::channel(PROGRESS_CHANNEL_CAP);
        let batch = {
            let items = new_items.clone();
            let tracker = Arc::clone(&tracker);
            tokio::task::spawn_blocking(move || coordinator.download_batch(items, &tracker, Some(tx)))
        };
        let (results, ()) = tokio::join!(
            batch,
            progress_loop::forward_progress(rx, &self.jobs, id, progress_tx)
        );
        let results = results?;
        tracing::debug!(identity = id, processed = results.len(), "download batch finished");

        let merged = catalog::merge(existing, &new_items);
        store
            .save(&merged)
            .map_err(|e| ArchiveError::persistence(store.path(), e))?;
        log.info(&format!("Saved library with {} items", merged.len()));

        let progress = tracker.snapshot();
        let errors = tracker.errors();
        log.complete(&progress);
        self.jobs
            .complete(id, &progress, &errors)
            .await
            .map_err(ArchiveError::Registry)?;

        Ok(ArchiveSummary {
            identity: id.to_string(),
            downloaded: progress.downloaded,
            total: merged.len(),
            progress,
            errors,
        })
    }

    async fn record_failure(&self, identity: &str, err: &ArchiveError) {
        if let Err(e) = self.jobs.fail(identity, &err.to_string()).await {
            tracing::warn!(identity, error = %e, "could not mark job failed");
        }
    }

    /// Latest job record for `identity`, if any run was started.
    pub async fn get_job(&self, identity: &str) -> Result<Option<JobRecord>, ArchiveError> {
        let identity = Identity::parse(identity)?;
        self.jobs
            .get(identity.as_str())
            .await
            .map_err(ArchiveError::Registry)
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>, ArchiveError> {
        self.jobs.get_all().await.map_err(ArchiveError::Registry)
    }

    /// Persisted catalog for `identity` (empty if it was never archived).
    pub fn library(&self, identity: &str) -> Result<Catalog, ArchiveError> {
        let identity = Identity::parse(identity)?;
        let paths = ArchivePaths::new(&self.data_dir, &identity);
        Ok(CatalogStore::new(paths.catalog).load())
    }
}
