use crate::server::auth::{hash_password, verify_password, Claims};
use crate::server::error::ApiError;
use crate::server::extract::ApiJson;
use crate::server::routes::{extension, read_file_field, remove_stored};
use crate::server::state::AppState;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use scholar_core::{new_id, Profile, ProfileUpdate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const PICTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Profile>, ApiError> {
    let user = state.db.get_user(claims.user_id)?;
    Ok(Json(user.profile()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    if !update.is_empty() {
        state.db.update_profile(claims.user_id, &update)?;
    }
    Ok(Json(json!({ "message": "Profile updated successfully" })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<ChangePassword>,
) -> Result<Json<Value>, ApiError> {
    let user = state.db.get_user(claims.user_id)?;

    if !verify_password(body.current_password, user.password_hash).await {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let min = state.config.auth.min_password_length;
    if body.new_password.chars().count() < min {
        return Err(ApiError::BadRequest(format!(
            "New password must be at least {} characters",
            min
        )));
    }

    let hash = hash_password(body.new_password, state.config.auth.bcrypt_cost).await?;
    state.db.update_password(user.id, &hash)?;
    info!("User {} changed their password", user.id);

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let part = read_file_field(&mut multipart, "profilePicture").await?;

    let ext = extension(&part.filename)
        .filter(|ext| PICTURE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Unsupported image type. Allowed: {}",
                PICTURE_EXTENSIONS.join(", ")
            ))
        })?;
    if part.data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let previous = state.db.get_user(claims.user_id)?.profile_picture;

    let dir = state.upload_dir().join("profile_pictures");
    let filename = format!("{}_{}.{}", claims.user_id, new_id(), ext);
    let target = dir.join(&filename);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create upload directory: {}", e)))?;
    tokio::fs::write(&target, &part.data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store picture: {}", e)))?;

    let url = format!("/uploads/profile_pictures/{}", filename);
    if let Err(e) = state.db.set_profile_picture(claims.user_id, &url) {
        remove_stored(&target).await;
        return Err(e.into());
    }

    // Only pictures we stored ourselves are removed
    if let Some(old) = previous.as_deref().and_then(|p| p.strip_prefix("/uploads/")) {
        remove_stored(&state.upload_dir().join(old)).await;
    }

    Ok(Json(json!({ "message": "Profile picture updated", "url": url })))
}

pub async fn connect_morgan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    state.db.set_morgan_connected(claims.user_id, true)?;
    Ok(Json(json!({
        "message": "Morgan State account connected",
        "morganConnected": true,
    })))
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::server::testing::{create_user, json_request, multipart_request, send, test_state};
    use axum::http::{Method, StatusCode};
    use scholar_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_profile_defaults_and_update() {
        let (state, _dir) = test_state(None);
        let (_, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let app = build_router(state);

        let (status, body) = send(&app, json_request(Method::GET, "/api/profile", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@morgan.edu");
        assert_eq!(body["major"], "Computer Science");
        assert_eq!(body["profilePicture"], "/user_icon.jpg");
        assert_eq!(body["morganConnected"], false);

        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                "/api/profile",
                Some(&token),
                Some(json!({"name": "Ada", "studentId": "M123"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated successfully");

        let (_, body) = send(&app, json_request(Method::GET, "/api/profile", Some(&token), None)).await;
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["studentId"], "M123");
        assert_eq!(body["major"], "Computer Science");
    }

    #[tokio::test]
    async fn test_profile_of_deleted_user() {
        let (state, _dir) = test_state(None);
        let (user, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        state.db.delete_user(user.id).unwrap();
        let app = build_router(state);

        let (status, _) = send(&app, json_request(Method::GET, "/api/profile", Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (state, _dir) = test_state(None);
        let (_, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/change-password",
                Some(&token),
                Some(json!({"currentPassword": "nope", "newPassword": "engine-2"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Current password is incorrect");

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/change-password",
                Some(&token),
                Some(json!({"currentPassword": "analytical", "newPassword": "abc"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/change-password",
                Some(&token),
                Some(json!({"currentPassword": "analytical", "newPassword": "engine-2"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"email": "ada@morgan.edu", "password": "engine-2"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_profile_picture() {
        let (state, dir) = test_state(None);
        let (user, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let app = build_router(state);

        let (status, _) = send(
            &app,
            multipart_request("/api/upload-profile-picture", &token, "profilePicture", "me.bmp", b"BM"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            multipart_request("/api/upload-profile-picture", &token, "profilePicture", "me.PNG", b"png"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with(&format!("/uploads/profile_pictures/{}_", user.id)));
        assert!(url.ends_with(".png"));

        let stored = dir.path().join("uploads").join(url.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(stored).unwrap(), b"png");

        let (_, profile) = send(&app, json_request(Method::GET, "/api/profile", Some(&token), None)).await;
        assert_eq!(profile["profilePicture"], url);
    }

    #[tokio::test]
    async fn test_connect_morgan() {
        let (state, _dir) = test_state(None);
        let (_, token) = create_user(&state, "ada@morgan.edu", "analytical", Role::Student).await;
        let app = build_router(state);

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/api/connect-morgan", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["morganConnected"], true);

        let (_, profile) = send(&app, json_request(Method::GET, "/api/profile", Some(&token), None)).await;
        assert_eq!(profile["morganConnected"], true);
    }
}
