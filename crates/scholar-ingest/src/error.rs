//! Error types for ingestion and the course catalog.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while reading documents or the catalog.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Parse error for {name}: {message}")]
    ParseError { name: String, message: String },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("{0} malformed")]
    MalformedCatalog(String),

    #[error("{0} not found")]
    CourseNotFound(String),

    #[error("Course already exists: {0}")]
    DuplicateCourse(String),
}
