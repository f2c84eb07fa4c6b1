//! Document uploads used for file-grounded chat.

use crate::server::auth::Claims;
use crate::server::error::ApiError;
use crate::server::routes::{read_file_field, remove_stored, sanitize_filename};
use crate::server::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use scholar_core::{new_id, UploadedFile};
use scholar_ingest::{content_hash, extract_text, is_supported_upload, SUPPORTED_UPLOADS};
use serde_json::{json, Value};
use tokio::task::JoinError;
use tracing::{info, warn};

fn file_url(file: &UploadedFile) -> String {
    format!("/uploads/{}", file.stored_path)
}

/// A parser panic means a malformed document, so it is reported as a 400.
fn extraction_aborted(filename: &str, err: JoinError) -> ApiError {
    if err.is_panic() {
        warn!("Text extraction panicked for {}", filename);
        ApiError::BadRequest(format!("Could not read {}: the file appears to be corrupt", filename))
    } else {
        ApiError::Internal(err.to_string())
    }
}

pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let part = read_file_field(&mut multipart, "file").await?;

    if !is_supported_upload(&part.filename) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type. Allowed: {}",
            SUPPORTED_UPLOADS.join(", ")
        )));
    }
    if part.data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    // PDF and DOCX parsing is CPU bound
    let name = part.filename.clone();
    let data = part.data.clone();
    let text = tokio::task::spawn_blocking(move || extract_text(&name, &data))
        .await
        .map_err(|e| extraction_aborted(&part.filename, e))??;

    let stored_path = format!("documents/{}_{}", new_id(), sanitize_filename(&part.filename));
    let target = state.upload_dir().join(&stored_path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create upload directory: {}", e)))?;
    }
    tokio::fs::write(&target, &part.data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store file: {}", e)))?;

    let mut file = UploadedFile::new(
        claims.user_id,
        &part.filename,
        &stored_path,
        content_hash(&part.data),
        text,
    );
    if let Some(content_type) = part.content_type {
        file = file.with_content_type(content_type);
    }
    if let Err(e) = state.db.create_uploaded_file(&file) {
        remove_stored(&target).await;
        return Err(e.into());
    }

    info!(
        "User {} uploaded {} ({} characters)",
        claims.user_id,
        file.filename,
        file.characters()
    );

    Ok(Json(json!({
        "file_id": file.id,
        "filename": file.filename,
        "url": file_url(&file),
        "characters": file.characters(),
    })))
}

pub async fn list_files(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    let files: Vec<Value> = state
        .db
        .list_uploaded_files(claims.user_id)?
        .iter()
        .map(|f| {
            json!({
                "file_id": f.id,
                "filename": f.filename,
                "url": file_url(f),
                "characters": f.characters(),
                "created_at": f.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "files": files })))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(file_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let file = state.db.delete_uploaded_file(claims.user_id, &file_id)?;

    remove_stored(&state.upload_dir().join(&file.stored_path)).await;

    Ok(Json(json!({ "message": format!("{} deleted", file.filename) })))
}
