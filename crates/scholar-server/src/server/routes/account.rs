//! Registration and login.

use crate::server::auth::{create_token, hash_password, verify_password};
use crate::server::error::ApiError;
use crate::server::extract::ApiJson;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use scholar_core::NewUser;
use scholar_db::DbError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Reject obviously invalid registrations before hashing.
pub fn validate_registration(email: &str, password: &str, min_length: usize) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if password.chars().count() < min_length {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            min_length
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = body.email.trim().to_lowercase();
    validate_registration(&email, &body.password, state.config.auth.min_password_length)?;

    if state.db.find_user_by_email(&email)?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let hash = hash_password(body.password, state.config.auth.bcrypt_cost).await?;
    let user = state
        .db
        .create_user(&NewUser::student(&email, hash))
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            DbError::Duplicate(_) => ApiError::BadRequest("Email already registered".to_string()),
            other => ApiError::from(other),
        })?;

    info!("Registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Student account created", "user_id": user.id })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<Json<Value>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let email = body.email.trim().to_lowercase();
    let user = state.db.find_user_by_email(&email)?.ok_or_else(invalid)?;

    if !verify_password(body.password, user.password_hash.clone()).await {
        return Err(invalid());
    }

    let token = create_token(&user, state.jwt_secret(), state.config.auth.token_ttl_minutes)?;
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}
