//! Markdown document parser.

use super::DocumentParser;
use crate::error::IngestResult;
use pulldown_cmark::{Event, Parser, Tag};

/// Parser for Markdown files. Markup is stripped, code blocks are kept fenced.
pub struct MarkdownParser {
    preserve_code_blocks: bool,
}

impl MarkdownParser {
    /// Create a new markdown parser.
    pub fn new() -> Self {
        Self {
            preserve_code_blocks: true,
        }
    }

    /// Strip markup, keeping headings as their own paragraphs.
    fn extract_text(&self, markdown: &str) -> String {
        let parser = Parser::new(markdown);
        let mut text = String::new();
        let mut in_heading = false;
        let mut current_heading = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::Heading(..)) => {
                    in_heading = true;
                    current_heading.clear();
                }
                Event::End(Tag::Heading(..)) => {
                    in_heading = false;
                    text.push_str(current_heading.trim());
                    text.push_str("\n\n");
                }
                Event::Start(Tag::CodeBlock(_)) if self.preserve_code_blocks => {
                    text.push_str("\n```\n");
                }
                Event::End(Tag::CodeBlock(_)) if self.preserve_code_blocks => {
                    text.push_str("```\n\n");
                }
                Event::End(Tag::Paragraph) => {
                    text.push_str("\n\n");
                }
                Event::End(Tag::List(_)) => {
                    text.push('\n');
                }
                Event::Start(Tag::Item) => {
                    text.push_str("- ");
                }
                Event::End(Tag::Item) => {
                    text.push('\n');
                }
                Event::Text(t) => {
                    if in_heading {
                        current_heading.push_str(&t);
                    } else {
                        text.push_str(&t);
                    }
                }
                Event::Code(code) => {
                    text.push('`');
                    text.push_str(&code);
                    text.push('`');
                }
                Event::SoftBreak | Event::HardBreak => {
                    text.push('\n');
                }
                _ => {}
            }
        }

        text.trim().to_string()
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, _name: &str, data: &[u8]) -> IngestResult<String> {
        Ok(self.extract_text(&String::from_utf8_lossy(data)))
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }
}
