use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::FeedbackRequest;
use crate::services::FeedbackService;

pub async fn submit_feedback(
    State(service): State<Arc<FeedbackService>>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let rating = request.rating;
    service.submit(request).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Thank you for your feedback!",
        "rating": rating
    })))
}

pub async fn list_feedback(
    State(service): State<Arc<FeedbackService>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let feedback = service.list().await?;
    Ok(Json(json!({
        "status": "success",
        "feedback": feedback
    })))
}
