//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub pinecone: PineconeConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from a specific path, then apply `.env` and
    /// environment overrides.
    pub fn load_with_env(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_from(path)?;
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path without consulting the environment.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Override secrets and endpoints from environment-style variables.
    ///
    /// Empty values are ignored so that an unset variable in a compose file
    /// does not wipe a value from the config file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.pinecone.api_key = v;
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.pinecone.index_name = v;
        }
        if let Some(v) = get("PINECONE_INDEX_HOST") {
            self.pinecone.index_host = Some(v);
        }
        if let Some(v) = get("PINECONE_NAMESPACE") {
            self.pinecone.namespace = v;
        }
        if let Some(v) = get("SCHOLAR_DATA_DIR") {
            self.catalog.data_dir = v;
        }
    }

    /// Names of credentials that are not configured.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai.api_key.is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.pinecone.api_key.is_empty() {
            missing.push("PINECONE_API_KEY");
        }
        if self.pinecone.index_name.is_empty() && self.pinecone.index_host.is_none() {
            missing.push("PINECONE_INDEX_NAME");
        }
        if self.auth.jwt_secret.is_empty() {
            missing.push("JWT_SECRET");
        }
        missing
    }

    /// Whether the embedding, vector index and chat model can be built.
    pub fn retrieval_configured(&self) -> bool {
        !self.openai.api_key.is_empty()
            && !self.pinecone.api_key.is_empty()
            && (!self.pinecone.index_name.is_empty() || self.pinecone.index_host.is_some())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Scholar Configuration
# Secrets may also come from the environment or a .env file:
# DATABASE_URL, JWT_SECRET, OPENAI_API_KEY, PINECONE_API_KEY,
# PINECONE_INDEX_NAME, PINECONE_INDEX_HOST, PINECONE_NAMESPACE

[server]
host = "0.0.0.0"
port = 8000

# Allowed CORS origins; empty allows any origin
cors_origins = []

# Where profile pictures and documents are stored (served under /uploads)
upload_dir = "uploads"
max_upload_mb = 10

[database]
# sqlite://<path>, sqlite:///<absolute path> or sqlite::memory:
url = "sqlite://./scholar.db"

[auth]
# jwt_secret = "change-me"
token_ttl_minutes = 240
min_password_length = 6
bcrypt_cost = 12

[openai]
base_url = "https://api.openai.com/v1"
chat_model = "gpt-3.5-turbo"
embedding_model = "text-embedding-3-small"
temperature = 0.0
timeout_seconds = 60

[pinecone]
# index_name = "curriculum"
# index_host = "https://curriculum-abc123.svc.us-east-1.pinecone.io"
namespace = "docs"

[catalog]
# Directory holding classes.json and the other JSON sources for ingestion
data_dir = "data_sources"
classes_file = "classes.json"
resources_file = "academic_resources.json"

[chat]
# Number of passages retrieved per question
top_k = 8
# Uploaded file text beyond this many characters is not sent to the model
max_file_chars = 12000

[ingest]
chunk_size = 800               # Tokens per chunk
chunk_overlap = 160            # Overlap between chunks
embed_batch_size = 64
"#
        .to_string()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub upload_dir: String,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![],
            upload_dir: "uploads".to_string(),
            max_upload_mb: 10,
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn upload_path(&self) -> PathBuf {
        PathBuf::from(&self.upload_dir)
    }
}

/// Where the relational database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

/// Relational database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./scholar.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection string to a SQLite location.
    pub fn location(&self) -> ConfigResult<DatabaseLocation> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".to_string()));
        }

        if url == "sqlite::memory:" || url == "sqlite://:memory:" || url == ":memory:" {
            return Ok(DatabaseLocation::Memory);
        }

        // SQLAlchemy style: sqlite:///relative.db and sqlite:////absolute.db
        if let Some(rest) = url.strip_prefix("sqlite:///") {
            if rest.is_empty() {
                return Err(ConfigError::Invalid("database.url has no path".to_string()));
            }
            return Ok(DatabaseLocation::File(PathBuf::from(rest)));
        }

        if let Some(rest) = url.strip_prefix("sqlite://") {
            if rest.is_empty() {
                return Err(ConfigError::Invalid("database.url has no path".to_string()));
            }
            return Ok(DatabaseLocation::File(PathBuf::from(rest)));
        }

        if let Some(rest) = url.strip_prefix("sqlite:") {
            return Ok(DatabaseLocation::File(PathBuf::from(rest)));
        }

        if url.contains("://") {
            return Err(ConfigError::UnsupportedDatabase(url.to_string()));
        }

        Ok(DatabaseLocation::File(PathBuf::from(url)))
    }
}

/// Token and password settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub min_password_length: usize,
    /// bcrypt work factor (4..=31).
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 240,
            min_password_length: 6,
            bcrypt_cost: 12,
        }
    }
}

/// Hosted embedding/completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
            timeout_seconds: 60,
        }
    }
}

/// Managed vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    pub index_host: Option<String>,
    pub namespace: String,
    pub controller_url: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: String::new(),
            index_host: None,
            namespace: "docs".to_string(),
            controller_url: "https://api.pinecone.io".to_string(),
        }
    }
}

/// Curriculum catalog and ingestion source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub data_dir: String,
    pub classes_file: String,
    pub resources_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: "data_sources".to_string(),
            classes_file: "classes.json".to_string(),
            resources_file: "academic_resources.json".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn classes_path(&self) -> PathBuf {
        self.data_path().join(&self.classes_file)
    }

    pub fn resources_path(&self) -> PathBuf {
        self.data_path().join(&self.resources_file)
    }
}

/// Chat dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub top_k: usize,
    pub max_file_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            max_file_chars: 12000,
        }
    }
}

/// Ingestion chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 160,
            embed_batch_size: 64,
        }
    }
}
