//! Job registry: one run record per identity.
//!
//! Creating a record for an identity replaces whatever was there; no history
//! beyond the most recent run is kept. The engine only talks to the
//! `JobStore` trait, so the backing store can be swapped without touching
//! the download path.

mod memory;
mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;

use crate::progress::{ItemError, ProgressSnapshot};

pub use memory::MemoryRegistry;
pub use sqlite::SqliteRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => anyhow::bail!("unknown job status {:?}", other),
        }
    }
}

/// State of the most recent archive run for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub identity: String,
    pub status: JobStatus,
    pub progress: ProgressSnapshot,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Per-item failures, filled in when the run completes.
    pub errors: Vec<ItemError>,
    /// Run-level failure message (status = failed).
    pub error: Option<String>,
}

impl JobRecord {
    /// Fresh record: running, zero progress, started now.
    pub fn started(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            status: JobStatus::Running,
            progress: ProgressSnapshot::default(),
            start_time: Utc::now(),
            end_time: None,
            errors: Vec::new(),
            error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}

/// Storage for job records keyed by identity.
///
/// Updates for an identity without a record are ignored.
pub trait JobStore: Send + Sync {
    /// Create (or replace) the record for `identity` with status running.
    fn create(&self, identity: &str) -> impl Future<Output = Result<JobRecord>> + Send;

    fn update_progress(
        &self,
        identity: &str,
        progress: &ProgressSnapshot,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Mark completed with the final counters and per-item errors.
    fn complete(
        &self,
        identity: &str,
        progress: &ProgressSnapshot,
        errors: &[ItemError],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Mark failed with a run-level error message.
    fn fail(&self, identity: &str, error: &str) -> impl Future<Output = Result<()>> + Send;

    fn get(&self, identity: &str) -> impl Future<Output = Result<Option<JobRecord>>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<JobRecord>>> + Send;
}
