//! Core domain types for Scholar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for users (database row id).
pub type UserId = i64;

/// Unique identifier for chat history rows.
pub type ChatId = i64;

/// Unique identifier for uploaded files.
pub type FileId = String;

/// Session used when the client does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Major assigned to new accounts.
pub const DEFAULT_MAJOR: &str = "Computer Science";

/// Picture shown until the user uploads one.
pub const DEFAULT_PROFILE_PICTURE: &str = "/user_icon.jpg";

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Account role carried in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub major: Option<String>,
    pub profile_picture: Option<String>,
    pub morgan_connected: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public view of the account as returned by the profile endpoint.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            name: self.name.clone(),
            student_id: self.student_id.clone(),
            major: self.major.clone(),
            profile_picture: self
                .profile_picture
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            morgan_connected: self.morgan_connected,
            created_at: self.created_at,
        }
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn student(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::Student,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Profile payload, camelCased for the web client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub major: Option<String>,
    pub profile_picture: String,
    pub morgan_connected: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.student_id.is_none() && self.major.is_none()
    }
}

/// One stored question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub id: ChatId,
    pub user_id: UserId,
    pub session_id: String,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Summary of one chat session for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub title: String,
    pub message_count: i64,
    pub last_activity: DateTime<Utc>,
}

/// Maximum length of a derived session title.
pub const SESSION_TITLE_LEN: usize = 60;

/// Derive a session title from its first query.
pub fn session_title(first_query: &str) -> String {
    let trimmed = first_query.trim();
    if trimmed.is_empty() {
        return "New Chat".to_string();
    }
    if trimmed.chars().count() <= SESSION_TITLE_LEN {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(SESSION_TITLE_LEN - 3).collect();
        format!("{}...", head.trim_end())
    }
}

/// A document uploaded by a user for file-grounded chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: FileId,
    pub user_id: UserId,
    pub filename: String,
    pub stored_path: String,
    pub content_type: Option<String>,
    pub content_hash: String,
    #[serde(skip_serializing)]
    pub content_text: String,
    pub created_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(
        user_id: UserId,
        filename: impl Into<String>,
        stored_path: impl Into<String>,
        content_hash: impl Into<String>,
        content_text: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            user_id,
            filename: filename.into(),
            stored_path: stored_path.into(),
            content_type: None,
            content_hash: content_hash.into(),
            content_text: content_text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Number of extracted characters.
    pub fn characters(&self) -> usize {
        self.content_text.chars().count()
    }
}

/// A course in the curriculum catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub course_name: String,
    pub credits: i64,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub offered: Vec<String>,
}

impl Course {
    /// Case-insensitive code comparison.
    pub fn has_code(&self, code: &str) -> bool {
        self.course_code.trim().eq_ignore_ascii_case(code.trim())
    }
}
