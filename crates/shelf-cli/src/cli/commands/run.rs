//! `shelf run` – archive new items of one identity.

use anyhow::{Context, Result};
use shelf_core::progress::ProgressSnapshot;
use shelf_core::registry::JobStore;
use shelf_core::{ArchiveEngine, ArchiveError};
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u128 = 500;

pub async fn run_archive<S: JobStore>(
    engine: &ArchiveEngine<S>,
    identity: &str,
    credential: &str,
) -> Result<()> {
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressSnapshot>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() >= PROGRESS_INTERVAL_MS
                || stats.is_finished()
            {
                println!(
                    "  {}/{} processed  ({} downloaded, {} failed, {} skipped)",
                    stats.processed(),
                    stats.total,
                    stats.downloaded,
                    stats.failed,
                    stats.skipped
                );
                last_print = now;
            }
        }
    });

    let result = engine
        .run_archive_with_progress(identity, credential, Some(progress_tx))
        .await;
    let _ = progress_handle.await;

    let summary = match result {
        Ok(summary) => summary,
        Err(err @ ArchiveError::AlreadyRunning(_)) => {
            return Err(err).context("pass --recover if the previous run crashed");
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "{}: downloaded {} new item(s); library now has {} item(s)",
        summary.identity, summary.downloaded, summary.total
    );
    if !summary.errors.is_empty() {
        println!("{} item(s) failed:", summary.errors.len());
        for e in &summary.errors {
            println!("  ✗ {}: {}", e.id, e.message);
        }
    }
    Ok(())
}
