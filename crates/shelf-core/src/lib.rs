pub mod config;
pub mod logging;

pub mod catalog;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod identity;
pub mod progress;
pub mod rate_limit;
pub mod registry;
pub mod remote;
pub mod retry;
pub mod run_log;
pub mod storage;

pub use engine::{ArchiveEngine, ArchiveSummary};
pub use error::ArchiveError;
