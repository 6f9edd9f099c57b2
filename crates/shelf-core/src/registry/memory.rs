//! Process-local registry (identity -> latest job record).

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{JobRecord, JobStatus, JobStore};
use crate::progress::{ItemError, ProgressSnapshot};

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_job(&self, identity: &str, f: impl FnOnce(&mut JobRecord)) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(identity) {
            f(job);
        }
    }
}

impl JobStore for MemoryRegistry {
    async fn create(&self, identity: &str) -> Result<JobRecord> {
        let job = JobRecord::started(identity);
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), job.clone());
        Ok(job)
    }

    async fn update_progress(&self, identity: &str, progress: &ProgressSnapshot) -> Result<()> {
        self.with_job(identity, |job| job.progress = *progress);
        Ok(())
    }

    async fn complete(
        &self,
        identity: &str,
        progress: &ProgressSnapshot,
        errors: &[ItemError],
    ) -> Result<()> {
        self.with_job(identity, |job| {
            job.status = JobStatus::Completed;
            job.end_time = Some(Utc::now());
            job.progress = *progress;
            job.errors = errors.to_vec();
        });
        Ok(())
    }

    async fn fail(&self, identity: &str, error: &str) -> Result<()> {
        self.with_job(identity, |job| {
            job.status = JobStatus::Failed;
            job.end_time = Some(Utc::now());
            job.error = Some(error.to_string());
        });
        Ok(())
    }

    async fn get(&self, identity: &str) -> Result<Option<JobRecord>> {
        Ok(self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<JobRecord>> {
        let mut all: Vec<JobRecord> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(all)
    }
}
