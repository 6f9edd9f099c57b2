//! Append-only log file for a single archive run.
//!
//! Every line is also forwarded to `tracing`. Write failures never abort the
//! run; they are reported through `tracing` only.

use chrono::{SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::progress::ProgressSnapshot;

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Run log for one identity. Shared by reference (or `Arc`) with all workers.
#[derive(Debug)]
pub struct RunLog {
    identity: String,
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl RunLog {
    /// Create `logs_dir/run-<timestamp>.log` and write the header line.
    /// If the file cannot be opened the log still works, forwarding to `tracing` only.
    pub fn init(logs_dir: &Path, identity: &str) -> Self {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = logs_dir.join(format!("run-{}.log", stamp));
        let opened = fs::create_dir_all(logs_dir).and_then(|_| {
            OpenOptions::new().create(true).append(true).open(&path)
        });
        let log = match opened {
            Ok(file) => RunLog {
                identity: identity.to_string(),
                path: Some(path),
                file: Mutex::new(Some(file)),
            },
            Err(e) => {
                tracing::error!(identity, "cannot open run log {}: {}", path.display(), e);
                RunLog::detached(identity)
            }
        };
        log.write_line(&format!("=== Archive Run Started: {} ===", now_rfc3339()));
        log
    }

    /// Log that only forwards to `tracing`.
    pub fn detached(identity: &str) -> Self {
        RunLog {
            identity: identity.to_string(),
            path: None,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: &str) {
        tracing::info!(identity = %self.identity, "{}", message);
        self.append(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(identity = %self.identity, "{}", message);
        self.append(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(identity = %self.identity, "{}", message);
        self.append(Level::Error, message);
    }

    /// Summary footer written once at the end of a run.
    pub fn complete(&self, stats: &ProgressSnapshot) {
        self.write_line(&format!("\n=== Archive Run Completed: {} ===", now_rfc3339()));
        self.write_line(&format!("Total: {}", stats.total));
        self.write_line(&format!("Downloaded: {}", stats.downloaded));
        self.write_line(&format!("Failed: {}", stats.failed));
        self.write_line(&format!("Skipped: {}", stats.skipped));
    }

    fn append(&self, level: Level, message: &str) {
        self.write_line(&format!("[{}] {}: {}", now_rfc3339(), level.as_str(), message));
    }

    fn write_line(&self, line: &str) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = guard.as_mut() else {
            return;
        };
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.write_all(b"\n")) {
            tracing::error!(identity = %self.identity, "failed to write run log: {}", e);
        }
    }
}
