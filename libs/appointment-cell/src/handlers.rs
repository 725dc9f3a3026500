// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{AppointmentError, AppointmentStatus, CreateAppointmentRequest, StatusUpdateRequest};
use crate::services::booking::AppointmentService;

fn parse_appointment_id(raw: &str) -> Result<i64, AppointmentError> {
    raw.parse()
        .map_err(|_| AppointmentError::InvalidId(raw.to_string()))
}

fn require_doctor(user: &User) -> Result<(), AppointmentError> {
    if user.is_doctor() {
        Ok(())
    } else {
        Err(AppointmentError::DoctorOnly)
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn create_appointment(
    State(service): State<Arc<AppointmentService>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = service.create(request).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Appointment booked successfully!",
        "appointment_id": appointment_id
    })))
}

pub async fn get_user_appointments(
    State(service): State<Arc<AppointmentService>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.list_for_user(&user_id).await?;
    Ok(Json(json!({ "appointments": appointments })))
}

pub async fn update_appointment_status(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_appointment_id(&appointment_id)?;
    let status: AppointmentStatus = request.status.parse()?;

    service.update_status(appointment_id, status).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Appointment status updated to {}", status)
    })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

pub async fn list_all_appointments(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointments = service.list_all(&user.username).await?;
    Ok(Json(json!({ "appointments": appointments })))
}

pub async fn delete_appointment(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let appointment_id = parse_appointment_id(&appointment_id)?;

    service.delete(appointment_id, &user.username).await?;
    info!("Appointment {} deleted by {}", appointment_id, user.username);

    Ok(Json(json!({
        "status": "success",
        "message": format!("Appointment {} deleted successfully", appointment_id)
    })))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

pub async fn get_doctor_appointments(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let appointments = service.doctor_appointments(user.id).await?;
    Ok(Json(json!({ "appointments": appointments })))
}

pub async fn get_doctor_patients(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let patients = service.doctor_patients(user.id).await?;
    Ok(Json(json!({ "patients": patients })))
}
