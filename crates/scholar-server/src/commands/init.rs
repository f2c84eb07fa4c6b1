//! Initialize Scholar.

use super::{config_file, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use scholar_config::Config;
use std::path::Path;

pub fn run(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_file(config_path)?;

    if path.exists() && !force {
        println!("{} Scholar is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", path.display());
        println!("  Use {} to overwrite it.", "scholar init --force".cyan());
        return Ok(());
    }

    println!("{}", "Initializing Scholar...".cyan().bold());

    Config::create_default_file(&path).context("Failed to create config file")?;
    println!("  {} Created config: {}", "✓".green(), path.display());

    let config = load_config(Some(&path))?;

    let upload_dir = config.server.upload_path();
    for dir in [
        upload_dir.clone(),
        upload_dir.join("profile_pictures"),
        upload_dir.join("documents"),
        config.catalog.data_path(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("  {} Created directory: {}", "✓".green(), dir.display());
    }

    println!();
    println!("{}", "Scholar initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set secrets in {} or the environment (OPENAI_API_KEY, PINECONE_API_KEY, JWT_SECRET)",
        ".env".cyan()
    );
    println!(
        "  2. Put curriculum JSON files in {}",
        config.catalog.data_path().display().to_string().cyan()
    );
    println!("  3. Index them: {}", "scholar ingest".cyan());
    println!("  4. Start the API: {}", "scholar serve".cyan());

    Ok(())
}
