//! Text extraction for uploaded documents.

mod docx;
mod markdown;
mod pdf;
mod text;

pub use docx::DocxParser;
pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::error::{IngestError, IngestResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Extensions accepted for file-grounded chat.
pub const SUPPORTED_UPLOADS: &[&str] = &["pdf", "docx", "txt", "md", "csv", "json"];

/// Trait for document parsers working on in-memory uploads.
pub trait DocumentParser: Send + Sync {
    /// Extract the text from the bytes of a file called `name`.
    fn parse(&self, name: &str, data: &[u8]) -> IngestResult<String>;

    /// Get the supported file extensions.
    fn extensions(&self) -> &[&str];

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Lowercased extension of a file name, if any.
pub(crate) fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check whether a file name has one of the accepted upload extensions.
pub fn is_supported_upload(name: &str) -> bool {
    extension_of(name)
        .map(|ext| SUPPORTED_UPLOADS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Extract text from an uploaded file, choosing the parser by extension.
pub fn extract_text(name: &str, data: &[u8]) -> IngestResult<String> {
    let extension = extension_of(name)
        .filter(|ext| SUPPORTED_UPLOADS.contains(&ext.as_str()))
        .ok_or_else(|| IngestError::UnsupportedFileType(name.to_string()))?;

    let parsers: [Box<dyn DocumentParser>; 3] = [
        Box::new(PdfParser::new()),
        Box::new(DocxParser::new()),
        Box::new(MarkdownParser::new()),
    ];

    for parser in &parsers {
        if parser.supports(&extension) {
            return parser.parse(name, data);
        }
    }

    TextParser::new().parse(name, data)
}

/// Hex SHA-256 of a byte slice.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
