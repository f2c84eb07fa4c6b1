//! Scholar AI - hosted model and vector index integration.
//!
//! This crate provides async clients for an OpenAI-compatible embedding and
//! chat completion API and a Pinecone-compatible vector index, the traits the
//! server codes against, and retrieval-augmented answering on top of them.

mod error;
mod openai;
mod pinecone;
pub mod rag;
mod traits;
mod types;

pub use error::{AiError, AiResult};
pub use openai::OpenAiClient;
pub use pinecone::PineconeClient;
pub use rag::{truncate_chars, RagAnswer, RetrievalQa};
pub use traits::{ChatModel, Embedder, IndexMatch, IndexRecord, VectorIndex};
pub use types::*;
