//! PDF document parser.

use super::DocumentParser;
use crate::error::{IngestError, IngestResult};
use tracing::debug;

/// Parser for PDF files.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, name: &str, data: &[u8]) -> IngestResult<String> {
        debug!("Parsing PDF: {}", name);

        let content = pdf_extract::extract_text_from_mem(data).map_err(|e| IngestError::ParseError {
            name: name.to_string(),
            message: format!("Failed to extract text from PDF: {}", e),
        })?;

        let content = clean_pdf_text(&content);
        debug!("Extracted {} characters from PDF", content.len());
        Ok(content)
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Trim lines, collapse blank runs and mark page breaks.
fn clean_pdf_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .fold(Vec::new(), |mut acc, line| {
            let last_was_empty = acc.last().map(|s: &String| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line.to_string());
            }
            acc
        })
        .join("\n")
        .replace('\x0C', "\n\n---\n\n")
        .trim()
        .to_string()
}
