//! Scholar Ingest - turning source files into text.
//!
//! This crate provides:
//! - JSON knowledge-base loading for the vector index
//! - Content chunking for RAG
//! - Text extraction from uploaded documents (PDF, DOCX, Markdown, plain text)
//! - The curriculum catalog file store

mod catalog;
mod chunker;
mod documents;
mod error;
mod parsers;

pub use catalog::CourseCatalog;
pub use chunker::{ChunkConfig, Chunker, TextChunk};
pub use documents::{list_json_sources, load_json_documents, SourceDocument};
pub use error::{IngestError, IngestResult};
pub use parsers::{content_hash, extract_text, is_supported_upload, SUPPORTED_UPLOADS};
