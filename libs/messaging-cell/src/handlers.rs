// libs/messaging-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{MessagingError, SendMessageRequest};
use crate::services::messages::MessagingService;

pub async fn send_message(
    State(service): State<Arc<MessagingService>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let message_id = service
        .send(&user, request.receiver_id, &request.content)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message_id": message_id
    })))
}

pub async fn get_conversation(
    State(service): State<Arc<MessagingService>>,
    Extension(user): Extension<User>,
    Path(partner_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let partner_id: i64 = partner_id
        .parse()
        .map_err(|_| MessagingError::InvalidPartner(partner_id.clone()))?;

    let messages = service.conversation(user.id, partner_id).await?;
    Ok(Json(json!({ "messages": messages })))
}

pub async fn list_conversations(
    State(service): State<Arc<MessagingService>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let conversations = service.conversations(user.id).await?;
    Ok(Json(json!({ "conversations": conversations })))
}
