// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// =====================================================================================
// AUDIT MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // Authentication
    UserRegistered,
    LoginSuccess,
    LoginFailed,
    AccountLocked,

    // Data access
    DataAccess,
    AdminDataAccess,

    // Appointments
    AppointmentCreated,
    AppointmentStatusChange,
    AppointmentDeleted,

    // Messaging
    MessageSent,

    // Abuse
    RateLimitExceeded,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::UserRegistered => "USER_REGISTERED",
            AuditEventType::LoginSuccess => "LOGIN_SUCCESS",
            AuditEventType::LoginFailed => "LOGIN_FAILED",
            AuditEventType::AccountLocked => "ACCOUNT_LOCKED",
            AuditEventType::DataAccess => "DATA_ACCESS",
            AuditEventType::AdminDataAccess => "ADMIN_DATA_ACCESS",
            AuditEventType::AppointmentCreated => "APPOINTMENT_CREATED",
            AuditEventType::AppointmentStatusChange => "APPOINTMENT_STATUS_CHANGE",
            AuditEventType::AppointmentDeleted => "APPOINTMENT_DELETED",
            AuditEventType::MessageSent => "MESSAGE_SENT",
            AuditEventType::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub severity: Severity,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            user_id: None,
            ip_address: None,
            details: None,
            severity: Severity::Info,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// User id as written to the log; unauthenticated events are attributed to `anonymous`.
    pub fn actor(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }
}

/// Row from the `security_logs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityLog {
    pub id: i64,
    pub event_type: String,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub severity: String,
    pub created_at: String,
}

// =====================================================================================
// ERROR MODELS
// =====================================================================================

#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Account temporarily locked. Try again in 15 minutes.")]
    AccountLocked,
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[error("Security service error: {0}")]
    ServiceError(String),
}

impl From<SecurityError> for shared_models::error::AppError {
    fn from(err: SecurityError) -> Self {
        use shared_models::error::AppError;

        match err {
            SecurityError::InvalidInput(msg) => AppError::BadRequest(msg),
            SecurityError::AccountLocked | SecurityError::RateLimited => {
                AppError::RateLimited(err.to_string())
            }
            SecurityError::Encryption(_)
            | SecurityError::PasswordHash(_)
            | SecurityError::ServiceError(_) => AppError::Internal(err.to_string()),
        }
    }
}
