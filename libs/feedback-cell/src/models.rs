use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

fn default_user_id() -> String {
    "default_user".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub user_id: String,
    pub rating: i64,
    pub comment: String,
    pub message_id: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::InvalidRating(_) => AppError::ValidationError(err.to_string()),
            FeedbackError::Database(e) => e.into(),
        }
    }
}
