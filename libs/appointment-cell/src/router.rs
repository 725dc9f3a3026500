// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::AppointmentService;

pub fn appointment_routes(service: Arc<AppointmentService>, config: Arc<AppConfig>) -> Router {
    // `{id}` is the owner's user id for GET and the numeric appointment id for PUT/DELETE
    let public_routes = Router::new()
        .route("/appointments", post(handlers::create_appointment))
        .route("/appointments/{id}", get(handlers::get_user_appointments))
        .route("/appointments/{id}", put(handlers::update_appointment_status));

    let protected_routes = Router::new()
        .route("/appointments/{id}", delete(handlers::delete_appointment))
        .route("/admin/appointments", get(handlers::list_all_appointments))
        .route("/doctor/appointments", get(handlers::get_doctor_appointments))
        .route("/doctor/patients", get(handlers::get_doctor_patients))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(service)
}
