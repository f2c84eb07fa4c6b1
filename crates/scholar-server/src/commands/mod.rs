//! CLI command implementations.

pub mod create_admin;
pub mod ingest;
pub mod init;
pub mod migrate;
pub mod serve;

use anyhow::{Context, Result};
use scholar_config::{AppPaths, Config, DatabaseLocation};
use scholar_db::Database;
use std::path::{Path, PathBuf};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// The config file to use: the `--config` flag or the platform default.
pub fn config_file(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(get_paths()?.config_file),
    }
}

/// Load configuration with `.env` and environment overrides applied.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = config_file(config_path)?;
    Config::load_with_env(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Open the configured database; opening patches the schema.
pub fn open_database(config: &Config) -> Result<Database> {
    let location = config
        .database
        .location()
        .context("Invalid database configuration")?;

    match location {
        DatabaseLocation::File(path) => Database::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display())),
        DatabaseLocation::Memory => {
            Database::open_in_memory().context("Failed to open in-memory database")
        }
    }
}
