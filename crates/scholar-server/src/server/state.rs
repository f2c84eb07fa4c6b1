//! Shared application state.

use scholar_ai::RetrievalQa;
use scholar_config::Config;
use scholar_db::Database;
use scholar_ingest::CourseCatalog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub catalog: Arc<CourseCatalog>,
    /// `None` until the OpenAI and Pinecone credentials are configured.
    pub qa: Option<RetrievalQa>,
    jwt_secret: Arc<String>,
}

impl AppState {
    pub fn new(config: Config, db: Database, qa: Option<RetrievalQa>) -> Self {
        let jwt_secret = if config.auth.jwt_secret.is_empty() {
            warn!("JWT_SECRET is not set; tokens will not survive a restart");
            format!("{}{}", scholar_core::new_id(), scholar_core::new_id())
        } else {
            config.auth.jwt_secret.clone()
        };

        Self {
            db,
            catalog: Arc::new(CourseCatalog::from_config(&config.catalog)),
            config: Arc::new(config),
            qa,
            jwt_secret: Arc::new(jwt_secret),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.server.upload_path()
    }
}
