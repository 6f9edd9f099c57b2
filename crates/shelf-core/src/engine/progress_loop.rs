//! Drains worker progress snapshots into the job registry.

use tokio::sync::mpsc::{Receiver, Sender};

use crate::progress::ProgressSnapshot;
use crate::registry::JobStore;

/// Persist every snapshot from `progress_rx` and forward it to `ui_tx` if set.
/// Returns once all senders (the download workers) are gone.
pub(super) async fn forward_progress<S: JobStore>(
    mut progress_rx: Receiver<ProgressSnapshot>,
    jobs: &S,
    identity: &str,
    ui_tx: Option<Sender<ProgressSnapshot>>,
) {
    while let Some(snapshot) = progress_rx.recv().await {
        if let Err(e) = jobs.update_progress(identity, &snapshot).await {
            tracing::warn!(identity, error = %e, "progress update failed");
        }
        if let Some(ref tx) = ui_tx {
            let _ = tx.try_send(snapshot);
        }
    }
}
