//! Pinecone-compatible vector index client.

use crate::error::{AiError, AiResult};
use crate::traits::{IndexMatch, IndexRecord, VectorIndex};
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scholar_config::PineconeConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const API_VERSION: &str = "2024-07";
const TIMEOUT_SECS: u64 = 60;

/// Client for one namespace of one index.
///
/// The data plane host is taken from configuration when set, otherwise it is
/// looked up from the control plane on first use and cached.
pub struct PineconeClient {
    client: Client,
    api_key: String,
    index_name: String,
    namespace: String,
    controller_url: String,
    host: OnceCell<String>,
}

impl PineconeClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &PineconeConfig) -> AiResult<Self> {
        if config.api_key.is_empty() {
            return Err(AiError::InvalidConfig("Pinecone API key is empty".to_string()));
        }
        if config.index_name.is_empty() && config.index_host.is_none() {
            return Err(AiError::InvalidConfig(
                "Pinecone index name or host is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(AiError::Http)?;

        let host = OnceCell::new();
        if let Some(configured) = config.index_host.as_deref().filter(|h| !h.is_empty()) {
            // Freshly created cell, so setting cannot fail
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            controller_url: config.controller_url.trim_end_matches('/').to_string(),
            host,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    /// Data plane base URL, resolving it from the control plane if needed.
    async fn host(&self) -> AiResult<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
                debug!("Resolving index host from {}", url);

                let description: IndexDescription =
                    send(self.authorized(self.client.get(&url)), &self.controller_url).await?;
                let host = normalize_host(&description.host);
                info!("Resolved index {} to {}", self.index_name, host);
                Ok::<_, AiError>(host)
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> AiResult<R> {
        let host = self.host().await?;
        let url = format!("{}{}", host, path);
        send(self.authorized(self.client.post(&url)).json(body), host).await
    }
}

async fn send<R: DeserializeOwned>(request: RequestBuilder, target: &str) -> AiResult<R> {
    let response = request
        .send()
        .await
        .map_err(|e| AiError::from_transport(e, target, TIMEOUT_SECS))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AiError::ApiError {
            status: status.as_u16(),
            message: text,
        });
    }

    // Some endpoints answer with an empty body
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Hosts from the control plane come without a scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> AiResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        let request = UpsertRequest {
            vectors: records
                .into_iter()
                .map(|r| PineconeVector {
                    id: r.id,
                    values: r.values,
                    metadata: serde_json::json!({ "source": r.source, "text": r.text }),
                })
                .collect(),
            namespace: self.namespace.clone(),
        };

        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        debug!("Upserted {} of {} vectors", response.upserted_count, count);
        Ok(count)
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> AiResult<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace: self.namespace.clone(),
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        Ok(response.matches.into_iter().filter_map(to_match).collect())
    }

    async fn delete_all(&self) -> AiResult<()> {
        let request = DeleteRequest {
            delete_all: true,
            namespace: self.namespace.clone(),
        };
        let _: serde_json::Value = self.post("/vectors/delete", &request).await?;
        info!("Deleted all vectors in namespace {}", self.namespace);
        Ok(())
    }
}

/// Matches without stored text cannot be used as context.
fn to_match(scored: ScoredVector) -> Option<IndexMatch> {
    let metadata = scored.metadata?;
    let text = metadata.get("text")?.as_str()?.to_string();
    let source = metadata
        .get("source")
        .and_then(|s| s.as_str())
        .map(|s| s.to_string());

    Some(IndexMatch {
        id: scored.id,
        score: scored.score,
        source,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PineconeConfig {
        PineconeConfig {
            api_key: "pc-test".to_string(),
            index_name: "curriculum".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("curriculum-abc.svc.pinecone.io"),
            "https://curriculum-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5081/"), "http://localhost:5081");
    }

    #[test]
    fn test_client_requires_credentials() {
        let mut missing_key = config();
        missing_key.api_key.clear();
        assert!(PineconeClient::from_config(&missing_key).is_err());

        let mut missing_index = config();
        missing_index.index_name.clear();
        assert!(PineconeClient::from_config(&missing_index).is_err());

        let client = PineconeClient::from_config(&config()).unwrap();
        assert_eq!(client.index_name(), "curriculum");
        assert_eq!(client.namespace(), "docs");
    }

    #[tokio::test]
    async fn test_configured_host_skips_lookup() {
        let mut config = config();
        config.index_host = Some("curriculum-abc.svc.pinecone.io".to_string());
        let client = PineconeClient::from_config(&config).unwrap();
        assert_eq!(
            client.host().await.unwrap(),
            "https://curriculum-abc.svc.pinecone.io"
        );
    }

    #[test]
    fn test_to_match_requires_text() {
        let with_text = ScoredVector {
            id: "1".to_string(),
            score: 0.5,
            metadata: Some(serde_json::json!({"text": "COSC 111", "source": "classes.json"})),
        };
        let matched = to_match(with_text).unwrap();
        assert_eq!(matched.text, "COSC 111");
        assert_eq!(matched.source.as_deref(), Some("classes.json"));

        let without = ScoredVector {
            id: "2".to_string(),
            score: 0.4,
            metadata: Some(serde_json::json!({"source": "x"})),
        };
        assert!(to_match(without).is_none());
    }
}
