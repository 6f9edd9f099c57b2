//! CLI for the shelf library archiver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shelf_core::config::{self, ArchiveConfig};
use shelf_core::registry::SqliteRegistry;
use shelf_core::remote::CurlClient;
use shelf_core::ArchiveEngine;
use std::path::PathBuf;
use std::sync::Arc;

use commands::{run_archive, run_library, run_status};

/// Top-level CLI for shelf.
#[derive(Debug, Parser)]
#[command(name = "shelf")]
#[command(about = "shelf: incremental local archive of a remote media library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch the library of an identity and download items not archived yet.
    Run {
        /// Account name; sanitized to [A-Za-z0-9_-] before use.
        identity: String,

        /// Session credential sent with every request.
        #[arg(long, env = "SHELF_CREDENTIAL", hide_env_values = true)]
        credential: String,

        /// Read configuration from this file instead of ~/.config/shelf/config.toml.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Parallel download workers (overrides the config file).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Mark runs left "running" by a crashed process as failed before starting.
        #[arg(long)]
        recover: bool,
    },

    /// Show the latest run of one identity, or of all identities.
    Status {
        /// Only show this identity.
        identity: Option<String>,
    },

    /// List the archived catalog of an identity.
    Library {
        /// Account name.
        identity: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                identity,
                credential,
                config: config_path,
                concurrency,
                recover,
            } => {
                let mut cfg = match config_path {
                    Some(path) => config::load_from_path(&path)?,
                    None => config::load_or_init()?,
                };
                if let Some(n) = concurrency {
                    cfg.concurrency = n;
                }
                tracing::debug!("loaded config: {:?}", cfg);
                let db = SqliteRegistry::open_default().await?;
                if recover {
                    let recovered = db.recover_running().await?;
                    if recovered > 0 {
                        tracing::info!("marked {} interrupted run(s) as failed", recovered);
                    }
                }
                let engine = build_engine(cfg, db)?;
                run_archive(&engine, &identity, &credential).await?;
            }
            CliCommand::Status { identity } => {
                let cfg = config::load_or_init()?;
                let db = SqliteRegistry::open_default().await?;
                let engine = build_engine(cfg, db)?;
                run_status(&engine, identity.as_deref()).await?;
            }
            CliCommand::Library { identity } => {
                let cfg = config::load_or_init()?;
                let db = SqliteRegistry::open_default().await?;
                let engine = build_engine(cfg, db)?;
                run_library(&engine, &identity)?;
            }
        }

        Ok(())
    }
}

/// Engine over libcurl and the on-disk run database, rooted at the configured data dir.
fn build_engine(cfg: ArchiveConfig, db: SqliteRegistry) -> Result<ArchiveEngine<SqliteRegistry>> {
    let data_dir = cfg.resolve_data_dir()?;
    let client = Arc::new(CurlClient::from_config(&cfg));
    Ok(ArchiveEngine::new(cfg, data_dir, client, db))
}

#[cfg(test)]
mod tests;
