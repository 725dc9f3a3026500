use std::env;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "healthlink-secret-key-change-in-production";
pub const DEFAULT_ENCRYPTION_KEY: &str = "healthlink-field-encryption-key-change-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub jwt_secret: String,
    pub encryption_key: String,
    pub database_path: String,
    pub data_dir: String,
    pub knowledge_base_path: String,
    pub rate_limit_requests: usize,
    pub rate_limit_window_secs: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .unwrap_or_default(),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_model: env::var("MODEL_NAME")
                .unwrap_or_else(|_| "gemini-pro".to_string()),
            jwt_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET_KEY not set, using development default");
                    DEFAULT_JWT_SECRET.to_string()
                }),
            encryption_key: env::var("ENCRYPTION_KEY")
                .unwrap_or_else(|_| {
                    warn!("ENCRYPTION_KEY not set, using development default");
                    DEFAULT_ENCRYPTION_KEY.to_string()
                }),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/health_chatbot.db".to_string()),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string()),
            knowledge_base_path: env::var("KNOWLEDGE_BASE_PATH")
                .unwrap_or_else(|_| "data/knowledge_base.json".to_string()),
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", 60),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 60),
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
            port: parse_or("PORT", 8080),
        };

        if !config.is_ai_configured() {
            warn!("No AI API configured. Set GROQ_API_KEY or GEMINI_API_KEY.");
        }

        config
    }

    pub fn is_groq_configured(&self) -> bool {
        !self.groq_api_key.is_empty()
    }

    pub fn is_gemini_configured(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }

    pub fn is_ai_configured(&self) -> bool {
        self.is_groq_configured() || self.is_gemini_configured()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
