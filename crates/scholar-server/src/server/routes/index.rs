use crate::server::auth::Claims;
use crate::server::error::ApiError;
use crate::server::pipeline::ingest_sources;
use crate::server::state::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use scholar_ai::{AiError, RetrievalQa};
use serde_json::{json, Value};
use tracing::info;

pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "pong" }))
}

fn retrieval(state: &AppState) -> Result<&RetrievalQa, ApiError> {
    state.qa.as_ref().ok_or_else(|| AiError::NotConfigured.into())
}

pub async fn ingest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    claims.require_admin()?;
    let qa = retrieval(&state)?;

    let chunks = ingest_sources(qa, &state.config).await?;
    info!("{} ingested {} chunks", claims.email, chunks);

    Ok(Json(json!({
        "message": format!("Ingested into {}:{}", qa.index_name(), qa.namespace()),
        "chunks": chunks,
    })))
}

pub async fn clear_index(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    claims.require_admin()?;
    let qa = retrieval(&state)?;

    qa.clear().await?;
    info!("{} cleared namespace {}", claims.email, qa.namespace());

    Ok(Json(json!({
        "message": format!("Cleared namespace '{}' in index {}", qa.namespace(), qa.index_name()),
    })))
}
