//! Process-wide `tracing` setup.
//!
//! `shelf` logs to `$XDG_STATE_HOME/shelf/shelf.log`; per-run logs are
//! separate (see `run_log`). `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,shelf=debug,shelf_core=debug";
const LOG_FILE_NAME: &str = "shelf.log";

/// Append handle on the process log. Each event gets its own clone of the
/// file; if cloning fails that event goes to stderr instead.
struct ProcessLog {
    file: File,
}

enum EventWriter {
    Log(File),
    Stderr(io::Stderr),
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EventWriter::Log(f) => f.write(buf),
            EventWriter::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EventWriter::Log(f) => f.flush(),
            EventWriter::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for ProcessLog {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.file.try_clone() {
            Ok(f) => EventWriter::Log(f),
            Err(_) => EventWriter::Stderr(io::stderr()),
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/shelf/shelf.log`, creating the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let state = xdg::BaseDirectories::with_prefix("shelf")?.get_state_home();
    fs::create_dir_all(&state)
        .with_context(|| format!("create log dir {}", state.display()))?;
    Ok(state.join(LOG_FILE_NAME))
}

/// Install the file subscriber. Errors leave no subscriber installed so the
/// caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(ProcessLog { file })
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {}", e))?;

    tracing::info!(path = %path.display(), "shelf logging initialized");
    Ok(())
}

/// Stderr-only subscriber. A no-op if one is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .try_init();
}
