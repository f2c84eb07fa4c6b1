//! DOCX document parser.

use super::DocumentParser;
use crate::error::{IngestError, IngestResult};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

/// Parser for Word (.docx) files. Only paragraph text is kept.
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for DocxParser {
    fn parse(&self, name: &str, data: &[u8]) -> IngestResult<String> {
        debug!("Parsing DOCX: {}", name);

        let docx = docx_rs::read_docx(data).map_err(|e| IngestError::ParseError {
            name: name.to_string(),
            message: format!("Failed to read DOCX: {}", e),
        })?;

        let mut paragraphs = Vec::new();
        for child in docx.document.children {
            if let DocumentChild::Paragraph(p) = child {
                let mut line = String::new();
                for child in p.children {
                    if let ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let RunChild::Text(t) = child {
                                line.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(line);
            }
        }

        Ok(paragraphs.join("\n").trim().to_string())
    }

    fn extensions(&self) -> &[&str] {
        &["docx"]
    }
}
