//! OpenAI-compatible HTTP client.

use crate::error::{AiError, AiResult};
use crate::traits::{ChatModel, Embedder};
use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use scholar_config::OpenAiConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Client for the embeddings and chat completion endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OpenAiConfig) -> AiResult<Self> {
        if config.api_key.is_empty() {
            return Err(AiError::InvalidConfig("OpenAI API key is empty".to_string()));
        }

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AiError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> AiResult<R> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::from_transport(e, &self.base_url, self.timeout.as_secs()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> AiResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            "Embedding {} texts with model {}",
            texts.len(),
            self.embedding_model
        );

        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };
        let response: EmbeddingResponse = self.post("/embeddings", &request).await?;

        order_embeddings(response, texts.len())
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> AiResult<String> {
        debug!("Completing with model {}", self.chat_model);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages,
            temperature: self.temperature,
        };
        let response: ChatResponse = self.post("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AiError::ParseError("completion had no choices".to_string()))
    }
}

/// Put embeddings back in request order and check the count.
fn order_embeddings(response: EmbeddingResponse, expected: usize) -> AiResult<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(AiError::ParseError(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
