//! Index management from the command line.

use super::load_config;
use crate::server::pipeline::collect_chunks;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scholar_ai::RetrievalQa;
use std::path::Path;

fn retrieval(config: &scholar_config::Config) -> Result<RetrievalQa> {
    RetrievalQa::from_config(config).context("Cannot reach the vector index")
}

/// Load the JSON data sources into the vector index.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let qa = retrieval(&config)?;

    println!(
        "{} {}",
        "Reading".cyan().bold(),
        config.catalog.data_path().display()
    );
    let (chunks, summary) = collect_chunks(&config)?;
    println!(
        "  {} {} files, {} documents, {} chunks",
        "✓".green(),
        summary.files,
        summary.documents,
        summary.chunks
    );

    if chunks.is_empty() {
        println!("{}", "Nothing to index.".yellow());
        return Ok(());
    }

    let batch_size = config.ingest.embed_batch_size.max(1);
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let rt = tokio::runtime::Runtime::new()?;
    let stored = rt.block_on(async {
        let mut stored = 0;
        for batch in chunks.chunks(batch_size) {
            stored += qa.index_chunks(batch, batch_size).await?;
            pb.inc(batch.len() as u64);
        }
        Ok::<_, scholar_ai::AiError>(stored)
    })?;
    pb.finish_and_clear();

    println!(
        "{} Ingested {} chunks into {}:{}",
        "✓".green(),
        stored,
        qa.index_name(),
        qa.namespace()
    );
    Ok(())
}

/// Delete every vector in the configured namespace.
pub fn clear(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let qa = retrieval(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(qa.clear())?;

    println!(
        "{} Cleared namespace '{}' in index {}",
        "✓".green(),
        qa.namespace(),
        qa.index_name()
    );
    Ok(())
}
