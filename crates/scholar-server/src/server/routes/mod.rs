//! Route handlers, one module per area.

pub mod account;
pub mod chat;
pub mod curriculum;
pub mod files;
pub mod index;
pub mod profile;

use crate::server::error::ApiError;
use axum::extract::Multipart;
use std::path::Path;
use tracing::warn;

/// One uploaded file from a multipart body.
pub struct UploadedPart {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Read the field called `name`, ignoring any others.
pub async fn read_file_field(multipart: &mut Multipart, name: &str) -> Result<UploadedPart, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".to_string()))?;
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await?.to_vec();

        return Ok(UploadedPart {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::BadRequest(format!("Missing form field '{}'", name)))
}

/// Delete a stored upload. Failures are logged, never returned.
pub async fn remove_stored(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let base = base.rsplit('\\').next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Lowercased extension, if any.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
