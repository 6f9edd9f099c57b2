//! CLI command handlers, one file per command.

mod library;
mod run;
mod status;

pub use library::run_library;
pub use run::run_archive;
pub use status::run_status;
