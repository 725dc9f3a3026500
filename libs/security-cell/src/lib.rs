// =====================================================================================
// SECURITY CELL - FIELD ENCRYPTION, VALIDATION, RATE LIMITING & AUDIT
// =====================================================================================

pub mod middleware;
pub mod models;
pub mod services;

use std::time::Duration;

use shared_config::AppConfig;
use shared_database::Database;
use tokio::sync::Mutex;

pub use middleware::{client_ip, security_middleware, ClientIp};
pub use models::{AuditEntry, AuditEventType, SecurityError, SecurityLog, Severity};
pub use services::{
    AuditService, FieldCipher, LoginThrottle, PasswordSecurityService, RateLimiter,
    ValidationService,
};

/// Security services shared by every cell.
pub struct SecurityServices {
    pub cipher: FieldCipher,
    pub validation: ValidationService,
    pub audit: AuditService,
    pub rate_limiter: Mutex<RateLimiter>,
    pub login_throttle: Mutex<LoginThrottle>,
}

impl SecurityServices {
    pub fn new(config: &AppConfig, db: Database) -> Result<Self, SecurityError> {
        Ok(Self {
            cipher: FieldCipher::new(&config.encryption_key)?,
            validation: ValidationService::new()?,
            audit: AuditService::new(db),
            rate_limiter: Mutex::new(RateLimiter::new(
                config.rate_limit_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            )),
            login_throttle: Mutex::new(LoginThrottle::default()),
        })
    }
}
