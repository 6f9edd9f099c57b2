//! Concurrent download of new catalog items.
//!
//! A fixed pool of worker threads drains one shared FIFO queue. Each worker
//! paces itself with the rate limiter, fetches through the retrying
//! `Fetcher`, writes the asset, records the outcome in the shared
//! `ProgressTracker`, and only then pulls the next item. Completion order
//! across workers is arbitrary.

mod item;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use crate::catalog::CatalogItem;
use crate::progress::{DownloadOutcome, ProgressSnapshot, ProgressTracker};
use crate::rate_limit::RateLimiter;
use crate::remote::Fetcher;
use crate::run_log::RunLog;

/// Outcome of one item, as reported by the worker that processed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub id: String,
    pub outcome: DownloadOutcome,
}

/// Everything a worker needs; shared read-only across the pool.
pub struct DownloadCoordinator {
    fetcher: Fetcher,
    limiter: RateLimiter,
    download_dir: PathBuf,
    extension: String,
    concurrency: usize,
    log: Arc<RunLog>,
}

impl DownloadCoordinator {
    pub fn new(
        fetcher: Fetcher,
        limiter: RateLimiter,
        download_dir: PathBuf,
        extension: impl Into<String>,
        concurrency: usize,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            download_dir,
            extension: extension.into(),
            concurrency: concurrency.max(1),
            log,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every item with `min(concurrency, items.len())` workers and return
    /// once the queue is drained and all workers have exited.
    /// Results come back in completion order. If `progress_tx` is `Some`, the
    /// tracker snapshot is sent after every item (`try_send`; a full channel
    /// drops intermediate updates, the final snapshot is always in `tracker`).
    pub fn download_batch(
        self: &Arc<Self>,
        items: Vec<CatalogItem>,
        tracker: &Arc<ProgressTracker>,
        progress_tx: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>,
    ) -> Vec<ItemResult> {
        let count = items.len();
        if count == 0 {
            return Vec::new();
        }

        let work: Arc<Mutex<VecDeque<CatalogItem>>> = Arc::new(Mutex::new(items.into()));
        let (tx, rx) = mpsc::channel();
        let num_workers = self.concurrency.min(count);
        let mut handles = Vec::with_capacity(num_workers);
        for worker in 0..num_workers {
            let work = Arc::clone(&work);
            let tx = tx.clone();
            let this = Arc::clone(self);
            let tracker = Arc::clone(tracker);
            let progress_tx = progress_tx.clone();
            handles.push(std::thread::spawn(move || {
                tracing::debug!(worker, "download worker started");
                loop {
                    // Lock only for the pop; the guard drops before the download.
                    let next = work.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                    let Some(item) = next else {
                        break;
                    };
                    let outcome = this.process_item(&item);
                    let snapshot = tracker.record_outcome(&item.id, &outcome);
                    if outcome == DownloadOutcome::Downloaded {
                        this.log.info(&format!(
                            "✓ {} ({}/{})",
                            item.id, snapshot.downloaded, snapshot.total
                        ));
                    }
                    if let Some(ptx) = &progress_tx {
                        let _ = ptx.try_send(snapshot);
                    }
                    let _ = tx.send(ItemResult {
                        id: item.id,
                        outcome,
                    });
                }
                tracing::debug!(worker, "download worker finished");
            }));
        }
        drop(tx);

        let results: Vec<ItemResult> = rx.iter().collect();
        for h in handles {
            if h.join().is_err() {
                self.log.error("download worker panicked");
            }
        }
        results
    }
}

#[cfg(test)]
mod tests;
