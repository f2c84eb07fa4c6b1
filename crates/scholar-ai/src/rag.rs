//! RAG (Retrieval-Augmented Generation) over the vector index.

use crate::error::{AiError, AiResult};
use crate::openai::OpenAiClient;
use crate::pinecone::PineconeClient;
use crate::traits::{ChatModel, Embedder, IndexMatch, IndexRecord, VectorIndex};
use scholar_config::Config;
use scholar_ingest::{content_hash, TextChunk};
use std::sync::Arc;
use tracing::{debug, info};

/// Separator placed between retrieved passages.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Outcome of a retrieval question.
#[derive(Debug, Clone)]
pub enum RagAnswer {
    /// The model answered using the retrieved passages.
    Answered {
        answer: String,
        /// Distinct source files of the passages, best match first.
        sources: Vec<String>,
    },
    /// The index returned nothing for the question.
    NoContext,
}

/// Build the context-stuffed prompt for a question.
pub fn build_context_prompt(question: &str, context: &[IndexMatch]) -> String {
    let passages: Vec<&str> = context.iter().map(|m| m.text.as_str()).collect();
    format!(
        "Use the context to answer concisely. If the answer is not in the context, say \"I don't know\".\n\n\
         Context:\n{}\n\n\
         Question: {}\n\
         Answer:",
        passages.join(CONTEXT_SEPARATOR),
        question
    )
}

/// Build the prompt for answering from an uploaded document.
pub fn build_file_prompt(question: &str, filename: &str, text: &str) -> String {
    format!(
        "Answer the question using only the document below. If the answer is not in the document, say \"I don't know\".\n\n\
         Document ({}):\n{}\n\n\
         Question: {}\n\
         Answer:",
        filename, text, question
    )
}

/// Build the system prompt shared by every completion.
pub fn build_system_prompt() -> String {
    r#"You are an academic assistant for university students.

Guidelines:
- Base your answers on the context or document provided
- Be concise and factual
- If the information is not available, say "I don't know"
- Do not make up courses, prerequisites or policies"#
        .to_string()
}

/// Keep at most `max_chars` characters. Returns the text and whether it was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Embedder, index and model wired together.
#[derive(Clone)]
pub struct RetrievalQa {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            model,
            top_k: top_k.max(1),
        }
    }

    /// Build the hosted clients from configuration.
    pub fn from_config(config: &Config) -> AiResult<Self> {
        if !config.retrieval_configured() {
            return Err(AiError::NotConfigured);
        }

        let openai = Arc::new(OpenAiClient::from_config(&config.openai)?);
        let index = Arc::new(PineconeClient::from_config(&config.pinecone)?);
        info!(
            "Retrieval ready: index {} namespace {} model {}",
            index.index_name(),
            index.namespace(),
            openai.chat_model()
        );

        Ok(Self::new(openai.clone(), index, openai, config.chat.top_k))
    }

    pub fn index_name(&self) -> &str {
        self.index.index_name()
    }

    pub fn namespace(&self) -> &str {
        self.index.namespace()
    }

    /// Answer a question from the indexed passages.
    pub async fn answer(&self, question: &str) -> AiResult<RagAnswer> {
        let vector = self.embedder.embed_query(question).await?;
        let context = self.index.query(vector, self.top_k).await?;
        debug!("Retrieved {} passages", context.len());

        if context.is_empty() {
            return Ok(RagAnswer::NoContext);
        }

        let prompt = build_context_prompt(question, &context);
        let system = build_system_prompt();
        let answer = self.model.complete(Some(&system), &prompt).await?;

        let mut sources: Vec<String> = Vec::new();
        for source in context.iter().filter_map(|m| m.source.as_ref()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        Ok(RagAnswer::Answered { answer, sources })
    }

    /// Answer a question from a single document's text.
    pub async fn answer_from_text(
        &self,
        question: &str,
        filename: &str,
        text: &str,
    ) -> AiResult<String> {
        let prompt = build_file_prompt(question, filename, text);
        let system = build_system_prompt();
        self.model.complete(Some(&system), &prompt).await
    }

    /// Embed chunks in batches and upsert them. Returns the number stored.
    pub async fn index_chunks(&self, chunks: &[TextChunk], batch_size: usize) -> AiResult<usize> {
        let mut stored = 0;

        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;

            let records = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, values)| IndexRecord {
                    id: chunk_id(chunk),
                    values,
                    source: chunk.source.clone(),
                    text: chunk.text.clone(),
                })
                .collect();

            stored += self.index.upsert(records).await?;
            debug!("Indexed {}/{} chunks", stored, chunks.len());
        }

        info!(
            "Indexed {} chunks into {}:{}",
            stored,
            self.index_name(),
            self.namespace()
        );
        Ok(stored)
    }

    /// Remove everything from the namespace.
    pub async fn clear(&self) -> AiResult<()> {
        self.index.delete_all().await
    }
}

/// Stable vector id so re-ingesting the same text overwrites instead of duplicating.
fn chunk_id(chunk: &TextChunk) -> String {
    content_hash(format!("{}:{}:{}", chunk.source, chunk.index, chunk.text).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> AiResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[derive(Default)]
    struct FakeIndex {
        records: Mutex<Vec<IndexRecord>>,
        upsert_calls: Mutex<usize>,
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        fn index_name(&self) -> &str {
            "test-index"
        }

        fn namespace(&self) -> &str {
            "docs"
        }

        async fn upsert(&self, records: Vec<IndexRecord>) -> AiResult<usize> {
            *self.upsert_calls.lock().unwrap() += 1;
            let count = records.len();
            let mut stored = self.records.lock().unwrap();
            for record in records {
                stored.retain(|r| r.id != record.id);
                stored.push(record);
            }
            Ok(count)
        }

        async fn query(&self, _vector: Vec<f32>, top_k: usize) -> AiResult<Vec<IndexMatch>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .take(top_k)
                .map(|r| IndexMatch {
                    id: r.id.clone(),
                    score: 1.0,
                    source: Some(r.source.clone()),
                    text: r.text.clone(),
                })
                .collect())
        }

        async fn delete_all(&self) -> AiResult<()> {
            self.records.lock().unwrap().clear();
            Ok(())
        }
    }

    /// Echoes the prompt back so tests can inspect it.
    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, _system: Option<&str>, prompt: &str) -> AiResult<String> {
            Ok(prompt.to_string())
        }
    }

    fn chunk(source: &str, index: usize, text: &str) -> TextChunk {
        TextChunk {
            source: source.to_string(),
            index,
            text: text.to_string(),
        }
    }

    fn qa(index: Arc<FakeIndex>) -> RetrievalQa {
        RetrievalQa::new(Arc::new(FakeEmbedder), index, Arc::new(EchoModel), 8)
    }

    #[test]
    fn test_build_context_prompt() {
        let context = vec![
            IndexMatch {
                id: "1".to_string(),
                score: 0.9,
                source: None,
                text: "COSC 111 is worth 4 credits.".to_string(),
            },
            IndexMatch {
                id: "2".to_string(),
                score: 0.8,
                source: None,
                text: "COSC 112 requires COSC 111.".to_string(),
            },
        ];

        let prompt = build_context_prompt("what does cosc 112 require?", &context);

        assert!(prompt.starts_with("Use the context to answer concisely."));
        assert!(prompt.contains("say \"I don't know\""));
        assert!(prompt.contains("4 credits.\n\n---\n\nCOSC 112"));
        assert!(prompt.ends_with("Question: what does cosc 112 require?\nAnswer:"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), ("hello".to_string(), false));
        assert_eq!(truncate_chars("héllo wörld", 5), ("héllo".to_string(), true));
    }

    #[tokio::test]
    async fn test_answer_without_context() {
        let qa = qa(Arc::new(FakeIndex::default()));
        let outcome = qa.answer("anything").await.unwrap();
        assert!(matches!(outcome, RagAnswer::NoContext));
    }

    #[tokio::test]
    async fn test_index_then_answer() {
        let index = Arc::new(FakeIndex::default());
        let qa = qa(index.clone());

        let chunks = vec![
            chunk("classes.json", 0, "COSC 111: Intro to CS"),
            chunk("classes.json", 1, "COSC 112: Data Structures"),
            chunk("support.json", 0, "Tutoring: Library room 2"),
        ];
        let stored = qa.index_chunks(&chunks, 2).await.unwrap();
        assert_eq!(stored, 3);
        assert_eq!(*index.upsert_calls.lock().unwrap(), 2);

        // Same chunks again overwrite rather than duplicate
        qa.index_chunks(&chunks, 64).await.unwrap();
        assert_eq!(index.records.lock().unwrap().len(), 3);

        match qa.answer("what is cosc 111?").await.unwrap() {
            RagAnswer::Answered { answer, sources } => {
                assert!(answer.contains("COSC 111: Intro to CS"));
                assert_eq!(sources, vec!["classes.json", "support.json"]);
            }
            RagAnswer::NoContext => panic!("expected an answer"),
        }

        qa.clear().await.unwrap();
        assert!(index.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answer_from_text() {
        let qa = qa(Arc::new(FakeIndex::default()));
        let answer = qa
            .answer_from_text("when is the exam?", "syllabus.pdf", "The exam is in May.")
            .await
            .unwrap();
        assert!(answer.contains("Document (syllabus.pdf):\nThe exam is in May."));
        assert!(answer.contains("Question: when is the exam?"));
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            RetrievalQa::from_config(&config),
            Err(AiError::NotConfigured)
        ));
    }
}
