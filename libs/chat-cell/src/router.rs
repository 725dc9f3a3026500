// libs/chat-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::chat::ChatService;

pub fn chat_routes(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/clear-context", post(handlers::clear_context))
        .route("/history/recent", get(handlers::recent_history))
        .with_state(service)
}
