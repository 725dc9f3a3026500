// libs/chat-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::models::{ChatRequest, ChatResponse, UserQuery};
use crate::services::chat::ChatService;

pub async fn chat(
    State(service): State<Arc<ChatService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = service.chat(&request).await?;
    info!("Returning {} sources", response.sources.len());
    Ok(Json(response))
}

/// Conversation context travels with each request, so there is nothing to clear server-side.
pub async fn clear_context(Query(query): Query<UserQuery>) -> Json<Value> {
    info!("Clearing context for user: {}", query.user_id);

    Json(json!({
        "status": "success",
        "message": "Context cleared successfully"
    }))
}

pub async fn recent_history(
    State(service): State<Arc<ChatService>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let (messages, pairs) = service.recent_history(&query.user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "history": pairs,
        "messages": messages
    })))
}
