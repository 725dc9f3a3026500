// libs/chat-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_USER_ID: &str = "default_user";

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

/// A prior turn supplied by the client. `role` is `user`, `model` or `assistant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ChatRequest {
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.history.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub category: String,
    pub url: String,
    pub source: String,
    pub relevance: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub sources: Vec<Source>,
    pub function_calls: Option<Value>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    User,
    Assistant,
}

impl HistoryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRole::User => "user",
            HistoryRole::Assistant => "assistant",
        }
    }
}

/// Stored chat turn as returned by `/history/recent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub message: String,
    pub timestamp: String,
}

/// A user message immediately answered by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPair {
    pub id: String,
    pub user_message: String,
    pub bot_message: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}
