//! Fakes and helpers shared by the server tests.

use crate::server::auth::{create_token, hash_password};
use crate::server::state::AppState;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use scholar_ai::{
    AiError, AiResult, ChatModel, Embedder, IndexMatch, IndexRecord, RetrievalQa, VectorIndex,
};
use scholar_config::Config;
use scholar_core::{NewUser, Role, User};
use scholar_db::Database;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

/// In-memory stand-in for the embedder, the vector index and the chat model.
///
/// The model echoes its prompt, so tests can see what was sent.
#[derive(Default)]
pub struct FakeBackend {
    records: Mutex<Vec<IndexRecord>>,
    embedded: Mutex<Vec<String>>,
    embed_calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl Embedder for FakeBackend {
    async fn embed(&self, texts: &[String]) -> AiResult<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded.lock().unwrap().extend(texts.iter().cloned());
        if self.fail {
            return Err(AiError::Connection("embedding service unreachable".to_string()));
        }
        Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
    }
}

#[async_trait]
impl VectorIndex for FakeBackend {
    fn index_name(&self) -> &str {
        "curriculum"
    }

    fn namespace(&self) -> &str {
        "docs"
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> AiResult<usize> {
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

#[async_trait]
impl ChatModel for FakeBackend {
    async fn complete(&self, _system: Option<&str>, prompt: &str) -> AiResult<String> {
        if self.fail {
            return Err(AiError::Timeout { seconds: 60 });
        }
        Ok(prompt.to_string())
    }
}

/// Handle on a [`FakeBackend`] that outlives the state it is wired into.
#[derive(Clone, Default)]
pub struct TestAi {
    backend: Arc<FakeBackend>,
}

impl TestAi {
    pub fn failing() -> Self {
        Self {
            backend: Arc::new(FakeBackend {
                fail: true,
                ..Default::default()
            }),
        }
    }

    pub fn qa(&self) -> RetrievalQa {
        RetrievalQa::new(
            self.backend.clone(),
            self.backend.clone(),
            self.backend.clone(),
            8,
        )
    }

    pub fn add_passage(&self, source: &str, text: &str) {
        self.backend.records.lock().unwrap().push(IndexRecord {
            id: format!("{}-{}", source, text.len()),
            values: vec![1.0],
            source: source.to_string(),
            text: text.to_string(),
        });
    }

    pub fn stored(&self) -> usize {
        self.backend.records.lock().unwrap().len()
    }

    pub fn embed_calls(&self) -> usize {
        self.backend.embed_calls.load(Ordering::SeqCst)
    }

    pub fn last_embedded(&self) -> Option<String> {
        self.backend.embedded.lock().unwrap().last().cloned()
    }
}

/// Config rooted in a temporary directory.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.auth.bcrypt_cost = 4;
    config.server.upload_dir = dir.path().join("uploads").to_string_lossy().into_owned();
    config.catalog.data_dir = dir.path().join("data").to_string_lossy().into_owned();
    config
}

/// State over an in-memory database and a temporary data directory.
pub fn test_state(qa: Option<RetrievalQa>) -> (AppState, TempDir) {
    test_state_with(qa, |_| {})
}

/// Like [`test_state`], with a chance to adjust the config first.
pub fn test_state_with(qa: Option<RetrievalQa>, configure: impl FnOnce(&mut Config)) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    let mut config = test_config(&dir);
    configure(&mut config);
    let db = Database::open_in_memory().unwrap();
    (AppState::new(config, db, qa), dir)
}

/// Create a user directly and return it with a valid token.
pub async fn create_user(state: &AppState, email: &str, password: &str, role: Role) -> (User, String) {
    let hash = hash_password(password.to_string(), 4).await.unwrap();
    let user = state
        .db
        .create_user(&NewUser::student(email, hash).with_role(role))
        .unwrap();
    let token = create_token(&user, TEST_SECRET, 5).unwrap();
    (user, token)
}

/// Build a request with an optional bearer token and JSON body.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Build a multipart upload with a single file field.
pub fn multipart_request(uri: &str, token: &str, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let boundary = "scholar-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Run one request through the router and decode the JSON reply.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}
