pub mod audit;
pub mod encryption;
pub mod password;
pub mod rate_limit;
pub mod validation;

pub use audit::AuditService;
pub use encryption::FieldCipher;
pub use password::PasswordSecurityService;
pub use rate_limit::{LoginThrottle, RateLimiter};
pub use validation::ValidationService;
