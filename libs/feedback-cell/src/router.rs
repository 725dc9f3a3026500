use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::FeedbackService;

pub fn feedback_routes(service: Arc<FeedbackService>, config: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/feedback", post(handlers::submit_feedback));

    let admin_routes = Router::new()
        .route("/admin/feedback", get(handlers::list_feedback))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(service)
}
