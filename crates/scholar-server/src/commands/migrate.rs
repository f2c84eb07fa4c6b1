//! Patch the database schema in place.

use super::load_config;
use anyhow::{Context, Result};
use colored::Colorize;
use scholar_config::DatabaseLocation;
use scholar_db::Database;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let path = match config
        .database
        .location()
        .context("Invalid database configuration")?
    {
        DatabaseLocation::File(path) => path,
        DatabaseLocation::Memory => {
            anyhow::bail!("An in-memory database has nothing to migrate")
        }
    };

    println!("{} {}", "Patching".cyan().bold(), path.display());

    let db = Database::connect(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    let added = db.patch_schema().context("Failed to patch schema")?;

    if added.is_empty() {
        println!("  {} Database schema is up to date.", "✓".green());
    } else {
        for column in &added {
            println!("  {} Added column {}", "✓".green(), column.cyan());
        }
    }

    if !db.integrity_check().context("Failed to check database integrity")? {
        println!("{} Integrity check reported problems.", "Warning:".yellow().bold());
    }

    Ok(())
}
