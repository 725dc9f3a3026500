// libs/auth-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use security_cell::SecurityError;
use shared_database::DatabaseError;
use shared_models::auth::{Role, TokenResponse};
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl RegisterRequest {
    /// Self-registration can create doctors and patients only.
    pub fn requested_role(&self) -> Role {
        match self.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(Role::Doctor)) => Role::Doctor,
            _ => Role::Patient,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Row of the `users` table.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub hashed_password: String,
    pub role: Role,
    pub specialty: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl UserRecord {
    /// Admin flag wins over the stored role.
    pub fn effective_role(&self) -> Role {
        if self.is_admin {
            Role::Admin
        } else {
            self.role
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub hashed_password: String,
    pub role: Role,
    pub specialty: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: String,
    pub message: String,
    #[serde(flatten)]
    pub token: TokenResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub role: Role,
    pub specialty: Option<String>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            role: record.effective_role(),
            username: record.username,
            email: record.email,
            is_admin: record.is_admin,
            specialty: record.specialty,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub username: String,
    pub specialty: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to issue token: {0}")]
    Token(String),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UsernameTaken => AppError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                AppError::Auth(err.to_string())
            }
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Security(e) => e.into(),
            AuthError::Database(e) => e.into(),
        }
    }
}
