use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

static NEXT_TEST_USER_ID: AtomicI64 = AtomicI64::new(1000);

pub struct TestConfig {
    pub jwt_secret: String,
    pub encryption_key: String,
    pub groq_base_url: String,
    pub gemini_base_url: String,
    pub rate_limit_requests: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            encryption_key: "test-encryption-key".to_string(),
            groq_base_url: "http://localhost:9901".to_string(),
            gemini_base_url: "http://localhost:9902".to_string(),
            rate_limit_requests: 60,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            groq_api_key: String::new(),
            groq_base_url: self.groq_base_url.clone(),
            groq_model: "llama-3.3-70b-versatile".to_string(),
            gemini_api_key: String::new(),
            gemini_base_url: self.gemini_base_url.clone(),
            gemini_model: "gemini-pro".to_string(),
            jwt_secret: self.jwt_secret.clone(),
            encryption_key: self.encryption_key.clone(),
            database_path: ":memory:".to_string(),
            data_dir: "data".to_string(),
            knowledge_base_path: "data/knowledge_base.json".to_string(),
            rate_limit_requests: self.rate_limit_requests,
            rate_limit_window_secs: 60,
            admin_username: None,
            admin_password: None,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test_user", Role::Patient)
    }
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: NEXT_TEST_USER_ID.fetch_add(1, Ordering::Relaxed),
            username: username.to_string(),
            role,
        }
    }

    pub fn with_id(id: i64, username: &str, role: Role) -> Self {
        Self {
            id,
            username: username.to_string(),
            role,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "username": user.username,
            "role": user.role.as_str(),
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_tokens_validate_against_shared_secret() {
        let config = TestConfig::default();
        let user = TestUser::doctor("dr_who");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

        let validated = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.role, Role::Doctor);
    }

    #[test]
    fn expired_and_forged_tokens_fail() {
        let config = TestConfig::default();
        let user = TestUser::patient("pat");

        assert!(validate_token(&JwtTestUtils::create_expired_token(&user, &config.jwt_secret), &config.jwt_secret).is_err());
        assert!(validate_token(&JwtTestUtils::create_invalid_signature_token(&user), &config.jwt_secret).is_err());
        assert!(validate_token(&JwtTestUtils::create_malformed_token(), &config.jwt_secret).is_err());
    }
}
