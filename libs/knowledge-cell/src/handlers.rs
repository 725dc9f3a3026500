// libs/knowledge-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use shared_models::error::AppError;

use crate::models::{EmbedRequest, KnowledgeStats};
use crate::services::store::KnowledgeBase;

pub async fn embed_document(
    State(knowledge): State<Arc<KnowledgeBase>>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<Value>, AppError> {
    knowledge
        .add_document(&request.id, &request.content, &request.category)
        .await
        .map_err(|e| {
            error!("Failed to add document {}: {}", request.id, e);
            AppError::Internal("Failed to add document".to_string())
        })?;

    info!("Document {} added successfully", request.id);

    Ok(Json(json!({
        "status": "success",
        "message": format!("Document {} added successfully", request.id)
    })))
}

pub async fn get_stats(State(knowledge): State<Arc<KnowledgeBase>>) -> Json<KnowledgeStats> {
    Json(knowledge.stats().await)
}
