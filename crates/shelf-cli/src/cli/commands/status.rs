//! `shelf status` – show the latest run per identity.

use anyhow::Result;
use shelf_core::registry::{JobRecord, JobStore};
use shelf_core::ArchiveEngine;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn run_status<S: JobStore>(
    engine: &ArchiveEngine<S>,
    identity: Option<&str>,
) -> Result<()> {
    let jobs: Vec<JobRecord> = match identity {
        Some(raw) => engine.get_job(raw).await?.into_iter().collect(),
        None => engine.list_jobs().await?,
    };
    if jobs.is_empty() {
        println!("No archive runs recorded.");
        return Ok(());
    }

    println!(
        "{:<20} {:<10} {:<16} {:<20} {}",
        "IDENTITY", "STATUS", "DL/FAIL/SKIP", "STARTED", "ENDED"
    );
    for j in &jobs {
        let counts = format!(
            "{}/{}/{} of {}",
            j.progress.downloaded, j.progress.failed, j.progress.skipped, j.progress.total
        );
        let ended = j
            .end_time
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<10} {:<16} {:<20} {}",
            j.identity,
            j.status.as_str(),
            counts,
            j.start_time.format(TIME_FORMAT),
            ended
        );
        if let Some(err) = &j.error {
            println!("    error: {}", err);
        }
        for e in &j.errors {
            println!("    ✗ {}: {}", e.id, e.message);
        }
    }
    Ok(())
}
