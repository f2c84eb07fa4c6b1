//! Loading the JSON data sources into the vector index.

use anyhow::{Context, Result};
use scholar_ai::RetrievalQa;
use scholar_config::Config;
use scholar_ingest::{list_json_sources, load_json_documents, ChunkConfig, Chunker, TextChunk};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files: usize,
    pub documents: usize,
    pub chunks: usize,
}

/// Read every `*.json` file in the data directory and chunk it.
pub fn collect_chunks(config: &Config) -> Result<(Vec<TextChunk>, IngestSummary)> {
    let dir = config.catalog.data_path();
    let files = list_json_sources(&dir)
        .with_context(|| format!("Failed to read data sources in {}", dir.display()))?;
    let documents = load_json_documents(&files);

    let chunker = Chunker::new(ChunkConfig::from_ingest_config(&config.ingest));
    let chunks: Vec<TextChunk> = documents
        .iter()
        .flat_map(|doc| chunker.chunk_text(&doc.source, &doc.text))
        .collect();

    let summary = IngestSummary {
        files: files.len(),
        documents: documents.len(),
        chunks: chunks.len(),
    };
    info!(
        "Prepared {} chunks from {} documents in {} files",
        summary.chunks, summary.documents, summary.files
    );
    Ok((chunks, summary))
}

/// Chunk, embed and upsert the data sources. Returns the number of chunks stored.
pub async fn ingest_sources(qa: &RetrievalQa, config: &Config) -> Result<usize> {
    let owned = config.clone();
    let (chunks, _) = tokio::task::spawn_blocking(move || collect_chunks(&owned))
        .await
        .context("Ingest task failed")??;

    let stored = qa
        .index_chunks(&chunks, config.ingest.embed_batch_size)
        .await
        .context("Failed to index chunks")?;
    Ok(stored)
}
