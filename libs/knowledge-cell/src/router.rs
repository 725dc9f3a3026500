// libs/knowledge-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::store::KnowledgeBase;

pub fn knowledge_routes(knowledge: Arc<KnowledgeBase>) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/embed", post(handlers::embed_document))
        .with_state(knowledge)
}
