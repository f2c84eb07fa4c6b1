//! Seams between the server and the hosted services.

use crate::error::AiResult;
use async_trait::async_trait;

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed several texts, returning vectors in input order.
    async fn embed(&self, texts: &[String]) -> AiResult<Vec<Vec<f32>>>;

    /// Embed a single query.
    async fn embed_query(&self, text: &str) -> AiResult<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::AiError::ParseError("empty embedding response".to_string()))
    }
}

/// Generates a completion for a prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> AiResult<String>;
}

/// A vector to store along with the text it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub source: String,
    pub text: String,
}

/// A stored text returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub source: Option<String>,
    pub text: String,
}

/// A namespaced vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the index, for messages.
    fn index_name(&self) -> &str;

    /// Namespace all calls operate on.
    fn namespace(&self) -> &str;

    /// Insert or overwrite records. Returns the number stored.
    async fn upsert(&self, records: Vec<IndexRecord>) -> AiResult<usize>;

    /// The `top_k` nearest stored texts.
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> AiResult<Vec<IndexMatch>>;

    /// Remove every vector in the namespace.
    async fn delete_all(&self) -> AiResult<()>;
}
