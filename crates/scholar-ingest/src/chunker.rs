//! Content chunking for the vector index.
//!
//! Text is split on paragraph boundaries first, then sentences, and as a
//! last resort by a hard character limit. Sizes are in characters, never
//! bytes, so multi-byte text is never cut mid-character.

use serde::Serialize;

/// Rough conversion used to turn token budgets into character budgets.
pub const CHARS_PER_TOKEN: usize = 4;

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target size of each chunk in characters.
    pub chunk_size: usize,
    /// Number of characters carried over between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks shorter than this are dropped unless they are the first or last one.
    pub min_chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800 * CHARS_PER_TOKEN,
            chunk_overlap: 160 * CHARS_PER_TOKEN,
            min_chunk_size: 50,
        }
    }
}

impl ChunkConfig {
    /// Create config from the token-based ingest settings.
    pub fn from_ingest_config(config: &scholar_config::IngestConfig) -> Self {
        let chunk_size = (config.chunk_size * CHARS_PER_TOKEN).max(1);
        Self {
            chunk_size,
            // Overlap must stay below the chunk size or the hard split never advances
            chunk_overlap: (config.chunk_overlap * CHARS_PER_TOKEN).min(chunk_size / 2),
            min_chunk_size: 50,
        }
    }
}

/// One piece of a source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChunk {
    /// File name the text came from.
    pub source: String,
    /// Position of the chunk within its document.
    pub index: usize,
    pub text: String,
}

/// Content chunker for splitting text.
pub struct Chunker {
    config: ChunkConfig,
}

struct ChunkBuffer<'a> {
    source: &'a str,
    config: &'a ChunkConfig,
    current: String,
    /// False while the buffer holds only overlap carried from the last chunk.
    fresh: bool,
    chunks: Vec<TextChunk>,
}

impl<'a> ChunkBuffer<'a> {
    fn len(&self) -> usize {
        self.current.chars().count()
    }

    fn emit(&mut self) {
        let text = self.current.trim();
        if text.is_empty() {
            return;
        }
        self.chunks.push(TextChunk {
            source: self.source.to_string(),
            index: self.chunks.len(),
            text: text.to_string(),
        });
    }

    /// Emit the current buffer and keep the configured overlap as the new start.
    fn flush(&mut self, keep_overlap: bool) {
        if self.fresh
            && (self.current.trim().chars().count() >= self.config.min_chunk_size
                || self.chunks.is_empty())
        {
            self.emit();
        }
        self.fresh = false;

        if keep_overlap && self.config.chunk_overlap > 0 {
            let chars: Vec<char> = self.current.chars().collect();
            let skip = chars.len().saturating_sub(self.config.chunk_overlap);
            self.current = chars[skip..].iter().collect();
        } else {
            self.current.clear();
        }
    }

    fn push(&mut self, separator: &str, piece: &str) {
        if !self.current.is_empty() {
            self.current.push_str(separator);
        }
        self.current.push_str(piece);
        self.fresh = true;
    }

    /// Emit whatever new text is left, however short.
    fn finish(mut self) -> Vec<TextChunk> {
        if self.fresh {
            self.emit();
        }
        self.chunks
    }
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Create a chunker with default configuration.
    pub fn default_chunker() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// Split text into chunks tagged with `source`.
    pub fn chunk_text(&self, source: &str, text: &str) -> Vec<TextChunk> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return vec![];
        }

        if trimmed.chars().count() <= self.config.chunk_size {
            return vec![TextChunk {
                source: source.to_string(),
                index: 0,
                text: trimmed.to_string(),
            }];
        }

        let mut buf = ChunkBuffer {
            source,
            config: &self.config,
            current: String::new(),
            fresh: false,
            chunks: Vec::new(),
        };

        for para in trimmed.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            let para_len = para.chars().count();

            if buf.len() > 0 && buf.len() + para_len + 2 > self.config.chunk_size {
                buf.flush(true);
            }

            if para_len <= self.config.chunk_size {
                buf.push("\n\n", para);
                continue;
            }

            // Paragraph too long on its own: go by sentences
            let sentences = split_sentences(para);
            if sentences.len() <= 1 {
                // No sentence breaks (tables, JSON dumps): force split by characters
                for piece in self.force_split_by_chars(para) {
                    if buf.len() > 0 && buf.len() + piece.chars().count() + 1 > self.config.chunk_size {
                        buf.flush(false);
                    }
                    buf.push(" ", &piece);
                }
            } else {
                for sentence in sentences {
                    if buf.len() > 0
                        && buf.len() + sentence.chars().count() + 1 > self.config.chunk_size
                    {
                        buf.flush(true);
                    }
                    buf.push(" ", sentence);
                }
            }
        }

        buf.finish()
    }

    /// Force split text by character limit, overlapping consecutive pieces.
    fn force_split_by_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut result = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = std::cmp::min(start + self.config.chunk_size, chars.len());
            result.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            let next = end.saturating_sub(self.config.chunk_overlap);
            start = if next > start { next } else { end };
        }

        result
    }
}

/// Split text into sentences ending in `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            let next_idx = i + c.len_utf8();
            if next_idx >= text.len()
                || text[next_idx..].starts_with(' ')
                || text[next_idx..].starts_with('\n')
            {
                let sentence = text[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = next_idx;
            }
        }
    }

    if start < text.len() {
        let remaining = text[start..].trim();
        if !remaining.is_empty() {
            sentences.push(remaining);
        }
    }

    sentences
}
