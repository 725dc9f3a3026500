// libs/messaging-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::messages::MessagingService;

pub fn messaging_routes(service: Arc<MessagingService>, config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/messages/send", post(handlers::send_message))
        .route("/messages/conversation/{partner_id}", get(handlers::get_conversation))
        .route("/messages/conversations", get(handlers::list_conversations))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
