//! Per-run progress counters and error list shared by download workers.
//!
//! Workers finish in any order; `ProgressTracker` serializes every update
//! behind one mutex so a snapshot is never a half-applied outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Counters for one run. `downloaded + failed + skipped <= total` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub downloaded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl ProgressSnapshot {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Items with a recorded outcome.
    pub fn processed(&self) -> u64 {
        self.downloaded + self.failed + self.skipped
    }

    pub fn is_finished(&self) -> bool {
        self.processed() >= self.total
    }
}

/// Per-item failure kept on the job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The item carries no asset URL.
    NoUrl,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoUrl => write!(f, "no-url"),
        }
    }
}

/// Result of processing one catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Default)]
struct ProgressState {
    snapshot: ProgressSnapshot,
    errors: Vec<ItemError>,
}

/// Mutex-guarded accumulator for one run.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                snapshot: ProgressSnapshot::new(total),
                errors: Vec::new(),
            }),
        }
    }

    /// Count `outcome` for item `id` and return the snapshot right after the update.
    /// A `Failed` outcome also appends to the error list under the same lock.
    pub fn record_outcome(&self, id: &str, outcome: &DownloadOutcome) -> ProgressSnapshot {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            DownloadOutcome::Downloaded => state.snapshot.downloaded += 1,
            DownloadOutcome::Skipped(_) => state.snapshot.skipped += 1,
            DownloadOutcome::Failed(message) => {
                state.snapshot.failed += 1;
                state.errors.push(ItemError {
                    id: id.to_string(),
                    message: message.clone(),
                });
            }
        }
        state.snapshot
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).snapshot
    }

    pub fn errors(&self) -> Vec<ItemError> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .errors
            .clone()
    }
}
