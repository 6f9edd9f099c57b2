//! SQLite-backed registry (sqlx) so run status survives the process.
//!
//! One row per identity; `create` replaces the row. Per-item errors are
//! stored as a JSON array.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use super::{JobRecord, JobStatus, JobStore};
use crate::progress::{ItemError, ProgressSnapshot};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

fn millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

/// Handle to the run database, by default `~/.local/state/shelf/runs.db`.
#[derive(Clone)]
pub struct SqliteRegistry {
    pool: Pool<Sqlite>,
}

impl SqliteRegistry {
    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("shelf")?;
        let db_path = xdg_dirs.get_state_home().join("runs.db");
        Self::open_at(&db_path).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open run database {}", path.display()))?;
        let db = SqliteRegistry { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// In-memory database (tests, throwaway runs).
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = SqliteRegistry { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                identity TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                total INTEGER NOT NULL DEFAULT 0,
                downloaded INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                skipped INTEGER NOT NULL DEFAULT 0,
                start_time INTEGER NOT NULL,
                end_time INTEGER,
                error TEXT,
                errors_json TEXT NOT NULL DEFAULT '[]'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark records left `running` by a process that died as failed.
    /// Call once at startup, before any run is started. Returns how many were reset.
    pub async fn recover_running(&self) -> Result<u64> {
        let now = millis(Utc::now());
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET status = 'failed',
                end_time = ?1,
                error = 'interrupted: process exited before the run finished'
            WHERE status = 'running'
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Write a status string verbatim, bypassing `JobStatus`.
    #[cfg(test)]
    pub(super) async fn set_raw_status(&self, identity: &str, status: &str) -> Result<()> {
        sqlx::query(r#"UPDATE runs SET status = ?1 WHERE identity = ?2"#)
            .bind(status)
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_record(row: &SqliteRow) -> Result<JobRecord> {
    let status: String = row.get("status");
    let errors_json: String = row.get("errors_json");
    let errors: Vec<ItemError> =
        serde_json::from_str(&errors_json).context("parse stored item errors")?;
    let end_time: Option<i64> = row.get("end_time");
    Ok(JobRecord {
        identity: row.get("identity"),
        status: status.parse::<JobStatus>()?,
        progress: ProgressSnapshot {
            total: row.get::<i64, _>("total") as u64,
            downloaded: row.get::<i64, _>("downloaded") as u64,
            failed: row.get::<i64, _>("failed") as u64,
            skipped: row.get::<i64, _>("skipped") as u64,
        },
        start_time: from_millis(row.get("start_time")),
        end_time: end_time.map(from_millis),
        errors,
        error: row.get("error"),
    })
}

impl JobStore for SqliteRegistry {
    async fn create(&self, identity: &str) -> Result<JobRecord> {
        let job = JobRecord::started(identity);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs (
                identity, status, total, downloaded, failed, skipped,
                start_time, end_time, error, errors_json
            ) VALUES (?1, ?2, 0, 0, 0, 0, ?3, NULL, NULL, '[]')
            "#,
        )
        .bind(identity)
        .bind(job.status.as_str())
        .bind(millis(job.start_time))
        .execute(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_progress(&self, identity: &str, progress: &ProgressSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE runs
            SET total = ?1, downloaded = ?2, failed = ?3, skipped = ?4
            WHERE identity = ?5
            "#,
        )
        .bind(progress.total as i64)
        .bind(progress.downloaded as i64)
        .bind(progress.failed as i64)
        .bind(progress.skipped as i64)
        .bind(identity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(
        &self,
        identity: &str,
        progress: &ProgressSnapshot,
        errors: &[ItemError],
    ) -> Result<()> {
        let errors_json = serde_json::to_string(errors)?;
        sqlx::query(
            r#"
            UPDATE runs
            SET status = 'completed',
                total = ?1, downloaded = ?2, failed = ?3, skipped = ?4,
                end_time = ?5,
                errors_json = ?6
            WHERE identity = ?7
            "#,
        )
        .bind(progress.total as i64)
        .bind(progress.downloaded as i64)
        .bind(progress.failed as i64)
        .bind(progress.skipped as i64)
        .bind(millis(Utc::now()))
        .bind(errors_json)
        .bind(identity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, identity: &str, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE runs
            SET status = 'failed', end_time = ?1, error = ?2
            WHERE identity = ?3
            "#,
        )
        .bind(millis(Utc::now()))
        .bind(error)
        .bind(identity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, identity: &str) -> Result<Option<JobRecord>> {
        let row = sqlx::query(r#"SELECT * FROM runs WHERE identity = ?1"#)
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn get_all(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(r#"SELECT * FROM runs ORDER BY identity ASC"#)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }
}
