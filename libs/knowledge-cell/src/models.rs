// libs/knowledge-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use shared_models::error::AppError;

pub const DEFAULT_CATEGORY: &str = "general";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A knowledge-base entry as persisted in the JSON store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            category: category.into(),
            url: String::new(),
            source: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub category: String,
    pub url: String,
    pub source: String,
}

/// Query hit; `distance` is `1 - similarity`, lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_documents: usize,
    /// Category counts in first-seen order.
    pub categories: Map<String, Value>,
    pub database_path: String,
}

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub id: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge base I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Knowledge base serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<KnowledgeError> for AppError {
    fn from(err: KnowledgeError) -> Self {
        AppError::Internal(err.to_string())
    }
}
