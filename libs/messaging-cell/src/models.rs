// libs/messaging-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use security_cell::SecurityError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
}

/// A decrypted direct message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_name: String,
    pub content: String,
    pub timestamp: String,
    pub read: bool,
}

/// One row of the inbox: the latest message exchanged with a partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub partner_id: i64,
    pub partner_name: String,
    pub last_message: String,
    pub last_timestamp: String,
    pub unread: usize,
}

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Recipient not found")]
    UnknownRecipient,

    #[error("Invalid partner id: {0}")]
    InvalidPartner(String),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::EmptyContent | MessagingError::InvalidPartner(_) => {
                AppError::BadRequest(err.to_string())
            }
            MessagingError::UnknownRecipient => AppError::NotFound(err.to_string()),
            MessagingError::Security(e) => e.into(),
            MessagingError::Database(e) => e.into(),
        }
    }
}
