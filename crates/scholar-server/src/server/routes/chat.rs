use crate::server::auth::Claims;
use crate::server::chat::{dispatch, ChatSource};
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use scholar_core::{ChatHistory, ChatSession, DEFAULT_SESSION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub source: ChatSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionFilter {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub session_id: String,
    pub query: String,
    pub response: String,
    pub timestamp: String,
}

impl From<ChatHistory> for HistoryEntry {
    fn from(entry: ChatHistory) -> Self {
        Self {
            id: entry.id,
            session_id: entry.session_id,
            query: entry.query,
            response: entry.response,
            timestamp: entry.timestamp.to_rfc3339(),
        }
    }
}

fn session_or_default(session_id: Option<String>) -> String {
    session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = session_or_default(body.session_id);
    let reply = dispatch(&state, claims.user_id, &body.query, body.file_id.as_deref()).await?;

    if reply.should_persist() {
        if let Err(e) =
            state
                .db
                .add_chat_entry(claims.user_id, &session_id, body.query.trim(), &reply.response)
        {
            warn!("Failed to store chat history: {}", e);
        }
    }

    Ok(Json(ChatResponse {
        response: reply.response,
        session_id,
        source: reply.source,
    }))
}

pub async fn chat_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(filter): ApiQuery<SessionFilter>,
) -> Result<Json<Value>, ApiError> {
    let session = filter.session_id.filter(|s| !s.trim().is_empty());
    let history: Vec<HistoryEntry> = state
        .db
        .chat_history(claims.user_id, session.as_deref(), None)?
        .into_iter()
        .map(HistoryEntry::from)
        .collect();

    Ok(Json(json!({ "history": history })))
}

pub async fn chat_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    let sessions: Vec<ChatSession> = state.db.chat_sessions(claims.user_id)?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// The body is optional, so it is parsed by hand.
pub async fn reset_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let filter: SessionFilter = if body.iter().all(|b| b.is_ascii_whitespace()) {
        SessionFilter::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let session = filter.session_id.filter(|s| !s.trim().is_empty());
    let deleted = state.db.clear_chat_history(claims.user_id, session.as_deref())?;

    Ok(Json(json!({ "message": "Chat history reset.", "deleted": deleted })))
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::server::chat::INITIALIZING;
    use crate::server::testing::{create_user, json_request, send, test_state, TestAi};
    use axum::http::{Method, StatusCode};
    use scholar_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_small_talk_is_stored() {
        let ai = TestAi::default();
        let (state, _dir) = test_state(Some(ai.qa()));
        let (user, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let db = state.db.clone();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/chat", Some(&token), Some(json!({"query": "Hello!"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello! How can I help you today?");
        assert_eq!(body["source"], "small_talk");
        assert_eq!(body["session_id"], "default");
        assert_eq!(ai.embed_calls(), 0);

        let history = db.chat_history(user.id, None, None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "Hello!");
    }

    #[tokio::test]
    async fn test_initializing_reply_is_not_stored() {
        let (state, _dir) = test_state(None);
        let (user, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let db = state.db.clone();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/chat",
                Some(&token),
                Some(json!({"query": "What is COSC 111?"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], INITIALIZING);
        assert!(db.chat_history(user.id, None, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query() {
        let (state, _dir) = test_state(None);
        let (_, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/chat", Some(&token), Some(json!({"query": "  "}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Query must not be empty");
    }

    #[tokio::test]
    async fn test_history_per_user_and_session() {
        let ai = TestAi::default();
        ai.add_passage("classes.json", "COSC 220: Data Structures");
        let (state, _dir) = test_state(Some(ai.qa()));
        let (_, ada) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let (_, bob) = create_user(&state, "bob@morgan.edu", "builder1", Role::Student).await;
        let app = build_router(state);

        for (token, query, session) in [
            (&ada, "what is cosc 220?", "s1"),
            (&ada, "thanks", "s1"),
            (&ada, "hi", "s2"),
            (&bob, "hello", "s1"),
        ] {
            let (status, _) = send(
                &app,
                json_request(
                    Method::POST,
                    "/chat",
                    Some(token),
                    Some(json!({"query": query, "session_id": session})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, json_request(Method::GET, "/chat-history", Some(&ada), None)).await;
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0]["query"], "what is cosc 220?");
        assert!(history[0]["response"].as_str().unwrap().contains("COSC 220"));

        let (_, body) = send(
            &app,
            json_request(Method::GET, "/chat-history?session_id=s1", Some(&ada), None),
        )
        .await;
        assert_eq!(body["history"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, json_request(Method::GET, "/chat-sessions", Some(&ada), None)).await;
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0]["session_id"], "s2");
        assert_eq!(sessions[1]["title"], "what is cosc 220?");
        assert_eq!(sessions[1]["message_count"], 2);

        let (_, body) = send(&app, json_request(Method::GET, "/chat-history", Some(&bob), None)).await;
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_history() {
        let (state, _dir) = test_state(None);
        let (user, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        state.db.add_chat_entry(user.id, "s1", "hi", "Hello!").unwrap();
        state.db.add_chat_entry(user.id, "s2", "bye", "Goodbye!").unwrap();
        state.db.add_chat_entry(user.id, "s2", "thanks", "You're welcome!").unwrap();
        let db = state.db.clone();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/reset-history",
                Some(&token),
                Some(json!({"session_id": "s2"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Chat history reset.");
        assert_eq!(body["deleted"], 2);

        let (_, body) = send(&app, json_request(Method::POST, "/reset-history", Some(&token), None)).await;
        assert_eq!(body["deleted"], 1);
        assert!(db.chat_history(user.id, None, None).unwrap().is_empty());
    }
}
