//! HTTP API.

pub mod auth;
pub mod chat;
pub mod error;
pub mod extract;
pub mod pipeline;
pub(crate) mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the full router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/api/change-password", post(routes::profile::change_password))
        .route(
            "/api/upload-profile-picture",
            post(routes::profile::upload_profile_picture),
        )
        .route("/api/connect-morgan", post(routes::profile::connect_morgan))
        .route("/api/upload-file", post(routes::files::upload_file))
        .route("/api/files", get(routes::files::list_files))
        .route("/api/files/{file_id}", delete(routes::files::delete_file))
        .route("/chat", post(routes::chat::chat))
        .route("/chat-history", get(routes::chat::chat_history))
        .route("/chat-sessions", get(routes::chat::chat_sessions))
        .route("/reset-history", post(routes::chat::reset_history))
        .route("/api/curriculum/add", post(routes::curriculum::add_course))
        .route(
            "/api/curriculum/update/{code}",
            put(routes::curriculum::update_course),
        )
        .route(
            "/api/curriculum/delete/{code}",
            delete(routes::curriculum::delete_course),
        )
        .route("/ingest", post(routes::index::ingest))
        .route("/clear-index", delete(routes::index::clear_index))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    let public = Router::new()
        .route("/ping", get(routes::index::ping))
        .route("/api/register", post(routes::account::register))
        .route("/api/login", post(routes::account::login))
        .route("/api/curriculum", get(routes::curriculum::list_courses))
        .route("/api/curriculum/{code}", get(routes::curriculum::get_course))
        .route("/api/resources", get(routes::curriculum::resources))
        .nest_service("/uploads", ServeDir::new(state.upload_dir()));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.cors_origins))
        .with_state(state)
}

/// Any origin unless specific origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    for dir in ["profile_pictures", "documents"] {
        let path = state.upload_dir().join(dir);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
