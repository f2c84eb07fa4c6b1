//! Course catalog. Reads are public, writes need an admin token.

use crate::server::auth::Claims;
use crate::server::error::ApiError;
use crate::server::extract::ApiJson;
use crate::server::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use scholar_core::Course;
use scholar_ingest::{CourseCatalog, IngestResult};
use serde_json::{json, Value};
use tracing::info;

/// Run a catalog operation on the blocking pool; it reads and rewrites files.
async fn with_catalog<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&CourseCatalog) -> IngestResult<T> + Send + 'static,
{
    let catalog = state.catalog.clone();
    tokio::task::spawn_blocking(move || op(&catalog))
        .await
        .map_err(|e| ApiError::Internal(format!("Catalog task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn validate_course(course: &Course) -> Result<(), ApiError> {
    if course.course_code.trim().is_empty() {
        return Err(ApiError::BadRequest("course_code is required".to_string()));
    }
    if course.course_name.trim().is_empty() {
        return Err(ApiError::BadRequest("course_name is required".to_string()));
    }
    Ok(())
}

pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(with_catalog(&state, |catalog| catalog.list()).await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(with_catalog(&state, move |catalog| catalog.get(&code)).await?))
}

pub async fn resources(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(with_catalog(&state, |catalog| catalog.resources()).await?))
}

pub async fn add_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(course): ApiJson<Course>,
) -> Result<Json<Value>, ApiError> {
    claims.require_admin()?;
    validate_course(&course)?;

    let added = course.clone();
    with_catalog(&state, move |catalog| catalog.add(&added)).await?;
    info!("{} added course {}", claims.email, course.course_code);

    Ok(Json(json!({ "message": "Course added", "course": course })))
}

pub async fn update_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    ApiJson(course): ApiJson<Course>,
) -> Result<Json<Value>, ApiError> {
    claims.require_admin()?;
    validate_course(&course)?;

    let (target, updated) = (code.clone(), course.clone());
    with_catalog(&state, move |catalog| catalog.update(&target, &updated)).await?;
    info!("{} updated course {}", claims.email, code);

    Ok(Json(json!({ "message": "Course updated", "course": course })))
}

pub async fn delete_course(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    claims.require_admin()?;

    let target = code.clone();
    with_catalog(&state, move |catalog| catalog.delete(&target)).await?;
    info!("{} deleted course {}", claims.email, code);

    Ok(Json(json!({ "message": format!("{} deleted", code) })))
}
