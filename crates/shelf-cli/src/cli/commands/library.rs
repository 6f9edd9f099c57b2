//! `shelf library` – list the archived catalog of an identity.

use anyhow::Result;
use shelf_core::registry::JobStore;
use shelf_core::ArchiveEngine;

pub fn run_library<S: JobStore>(engine: &ArchiveEngine<S>, identity: &str) -> Result<()> {
    let catalog = engine.library(identity)?;
    if catalog.is_empty() {
        println!("No archived items for {}.", identity);
        return Ok(());
    }

    println!("{:<40} {}", "ID", "ASSET");
    for item in &catalog {
        let asset = if item.asset_url().is_some() { "yes" } else { "-" };
        println!("{:<40} {}", item.id, asset);
    }
    println!("{} item(s)", catalog.len());
    Ok(())
}
