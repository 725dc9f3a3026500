// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use security_cell::SecurityError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// STATUS
// ==============================================================================

/// Lifecycle is client-driven; any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Accepted,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Accepted,
        AppointmentStatus::Rejected,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Accepted => "accepted",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| AppointmentError::InvalidStatus(s.to_string()))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_appointment_type() -> String {
    "General Consultation".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_phone: String,
    #[serde(default = "default_appointment_type")]
    pub appointment_type: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Decrypted appointment as shown to the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub id: i64,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub appointment_type: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub notes: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAppointment {
    pub user_id: String,
    #[serde(flatten)]
    pub summary: AppointmentSummary,
}

/// `patient_id` is the numeric account id of the booking user, when one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAppointment {
    pub user_id: String,
    pub patient_id: Option<i64>,
    pub department: Option<String>,
    #[serde(flatten)]
    pub summary: AppointmentSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorPatient {
    pub user_id: String,
    pub patient_id: Option<i64>,
    pub user_name: String,
    pub last_appointment: String,
    pub appointment_count: usize,
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid status: {0}. Must be one of: pending, confirmed, cancelled, accepted, rejected, completed")]
    InvalidStatus(String),

    #[error("Invalid appointment id: {0}")]
    InvalidId(String),

    #[error("Doctor access required")]
    DoctorOnly,

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidStatus(_) | AppointmentError::InvalidId(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::DoctorOnly => AppError::Forbidden(err.to_string()),
            AppointmentError::Security(e) => e.into(),
            AppointmentError::Database(e) => e.into(),
        }
    }
}
