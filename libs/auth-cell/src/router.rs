use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::auth::AuthService;

/// Mounted under `/auth`.
pub fn auth_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/me", get(handlers::me))
        .with_state(service)
}

pub fn doctor_directory_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .with_state(service)
}
