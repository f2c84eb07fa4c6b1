//! Plain text parser (txt, csv, json).

use super::DocumentParser;
use crate::error::IngestResult;

/// Parser for plain text. Invalid UTF-8 is replaced rather than rejected.
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, _name: &str, data: &[u8]) -> IngestResult<String> {
        Ok(String::from_utf8_lossy(data).trim().to_string())
    }

    fn extensions(&self) -> &[&str] {
        &["txt", "csv", "json"]
    }
}
