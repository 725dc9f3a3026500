// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info, instrument, warn};

use security_cell::{AuditEntry, AuditEventType, SecurityServices};
use shared_database::{now_timestamp, Database};

use crate::models::{
    AdminAppointment, AppointmentError, AppointmentStatus, AppointmentSummary,
    CreateAppointmentRequest, DoctorAppointment, DoctorPatient,
};

const NAME_MAX_LEN: usize = 100;
const NOTES_MAX_LEN: usize = 1000;

const APPOINTMENT_COLUMNS: &str = "a.id, a.user_id, a.department, a.user_name, a.user_email, \
     a.user_phone, a.appointment_type, a.preferred_date, a.preferred_time, a.notes, a.status, \
     a.created_at, a.is_encrypted";

/// Appointment row exactly as stored; contact fields and notes may be ciphertext.
struct StoredAppointment {
    id: i64,
    user_id: String,
    department: Option<String>,
    user_name: String,
    user_email: Option<String>,
    user_phone: Option<String>,
    appointment_type: String,
    preferred_date: String,
    preferred_time: String,
    notes: Option<String>,
    status: String,
    created_at: String,
    is_encrypted: bool,
}

impl StoredAppointment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let is_encrypted: i64 = row.get(12)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            department: row.get(2)?,
            user_name: row.get(3)?,
            user_email: row.get(4)?,
            user_phone: row.get(5)?,
            appointment_type: row.get(6)?,
            preferred_date: row.get(7)?,
            preferred_time: row.get(8)?,
            notes: row.get(9)?,
            status: row.get(10)?,
            created_at: row.get(11)?,
            is_encrypted: is_encrypted != 0,
        })
    }
}

pub struct AppointmentService {
    db: Database,
    security: Arc<SecurityServices>,
}

impl AppointmentService {
    pub fn new(db: Database, security: Arc<SecurityServices>) -> Self {
        Self { db, security }
    }

    fn reveal(&self, stored: &StoredAppointment, value: Option<&str>) -> String {
        match value {
            Some(v) if !v.is_empty() && stored.is_encrypted => self.security.cipher.decrypt(v),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }

    fn summarize(&self, stored: StoredAppointment) -> AppointmentSummary {
        AppointmentSummary {
            user_email: self.reveal(&stored, stored.user_email.as_deref()),
            user_phone: self.reveal(&stored, stored.user_phone.as_deref()),
            notes: self.reveal(&stored, stored.notes.as_deref()),
            id: stored.id,
            user_name: stored.user_name,
            appointment_type: stored.appointment_type,
            preferred_date: stored.preferred_date,
            preferred_time: stored.preferred_time,
            status: stored.status,
            created_at: stored.created_at,
        }
    }

    /// Stores a new `pending` appointment with contact details and notes encrypted.
    ///
    /// Malformed email or phone values are logged but still accepted.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create(&self, request: CreateAppointmentRequest) -> Result<i64, AppointmentError> {
        let validation = &self.security.validation;
        if let Err(e) = validation.validate_email(&request.user_email) {
            warn!("Invalid email format: {}", e);
        }
        if let Err(e) = validation.validate_phone(&request.user_phone) {
            warn!("Invalid phone format: {}", e);
        }

        let user_name = validation.sanitize_input(&request.user_name, NAME_MAX_LEN);
        let notes = validation.sanitize_input(request.notes.as_deref().unwrap_or(""), NOTES_MAX_LEN);

        let cipher = &self.security.cipher;
        let user_email = cipher.encrypt(&request.user_email)?;
        let user_phone = cipher.encrypt(&request.user_phone)?;
        let notes = cipher.encrypt(&notes)?;

        let user_id = request.user_id.clone();
        let appointment_id = self
            .db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO appointments (user_id, doctor_id, doctor_name, department, user_name,
                         user_email, user_phone, appointment_type, preferred_date, preferred_time,
                         notes, status, created_at, is_encrypted)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)",
                    params![
                        request.user_id,
                        request.doctor_id,
                        request.doctor_name,
                        request.department,
                        user_name,
                        user_email,
                        user_phone,
                        request.appointment_type,
                        request.preferred_date,
                        request.preferred_time,
                        notes,
                        AppointmentStatus::Pending.as_str(),
                        now_timestamp()
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::AppointmentCreated)
                    .with_user(user_id)
                    .with_details(format!("Appointment ID: {}", appointment_id)),
            )
            .await;
        info!("Appointment {} booked", appointment_id);

        Ok(appointment_id)
    }

    /// The user's appointments, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AppointmentSummary>, AppointmentError> {
        let owner = user_id.to_string();
        let stored = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
                     WHERE a.user_id = ?1 ORDER BY a.created_at DESC, a.id DESC"
                ))?;
                let rows = stmt
                    .query_map([owner], StoredAppointment::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::DataAccess)
                    .with_user(user_id)
                    .with_details(format!("Accessed {} appointments", stored.len())),
            )
            .await;

        Ok(stored.into_iter().map(|a| self.summarize(a)).collect())
    }

    pub async fn list_all(&self, actor: &str) -> Result<Vec<AdminAppointment>, AppointmentError> {
        let stored = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
                     ORDER BY a.created_at DESC, a.id DESC"
                ))?;
                let rows = stmt
                    .query_map([], StoredAppointment::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::AdminDataAccess)
                    .with_user(actor)
                    .with_details(format!("Accessed all appointments ({} records)", stored.len())),
            )
            .await;

        Ok(stored
            .into_iter()
            .map(|a| AdminAppointment {
                user_id: a.user_id.clone(),
                summary: self.summarize(a),
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        let updated = self
            .db
            .call(move |conn| {
                let current: Option<(String, String)> = conn
                    .query_row(
                        "SELECT user_id, status FROM appointments WHERE id = ?1",
                        [appointment_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                if current.is_some() {
                    conn.execute(
                        "UPDATE appointments SET status = ?1 WHERE id = ?2",
                        params![status.as_str(), appointment_id],
                    )?;
                }
                Ok(current)
            })
            .await?;

        let (owner, old_status) = updated.ok_or(AppointmentError::NotFound)?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::AppointmentStatusChange)
                    .with_user(owner)
                    .with_details(format!(
                        "Appointment {}: {} -> {}",
                        appointment_id, old_status, status
                    )),
            )
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, appointment_id: i64, actor: &str) -> Result<(), AppointmentError> {
        let removed = self
            .db
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM appointments WHERE id = ?1", [appointment_id])?)
            })
            .await?;

        if removed == 0 {
            return Err(AppointmentError::NotFound);
        }

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::AppointmentDeleted)
                    .with_user(actor)
                    .with_details(format!("Deleted appointment ID: {}", appointment_id)),
            )
            .await;

        Ok(())
    }

    /// Appointments booked with `doctor_id`, newest first, with the patient's account id
    /// resolved from the booking's user id.
    pub async fn doctor_appointments(&self, doctor_id: i64) -> Result<Vec<DoctorAppointment>, AppointmentError> {
        let stored = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {APPOINTMENT_COLUMNS}, u.id FROM appointments a
                     LEFT JOIN users u ON u.username = a.user_id
                     WHERE a.doctor_id = ?1
                     ORDER BY a.created_at DESC, a.id DESC"
                ))?;
                let rows = stmt
                    .query_map([doctor_id], |row| {
                        Ok((StoredAppointment::from_row(row)?, row.get::<_, Option<i64>>(13)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        debug!("Doctor {} has {} appointments", doctor_id, stored.len());

        Ok(stored
            .into_iter()
            .map(|(a, patient_id)| DoctorAppointment {
                user_id: a.user_id.clone(),
                department: a.department.clone(),
                patient_id,
                summary: self.summarize(a),
            })
            .collect())
    }

    /// One entry per patient with at least one `accepted` appointment with `doctor_id`,
    /// in booking order.
    pub async fn doctor_patients(&self, doctor_id: i64) -> Result<Vec<DoctorPatient>, AppointmentError> {
        let rows = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT a.user_id, u.id, a.user_name, a.preferred_date FROM appointments a
                     LEFT JOIN users u ON u.username = a.user_id
                     WHERE a.doctor_id = ?1 AND a.status = ?2
                     ORDER BY a.id",
                )?;
                let rows = stmt
                    .query_map(params![doctor_id, AppointmentStatus::Accepted.as_str()], |row| {
                        Ok(DoctorPatient {
                            user_id: row.get(0)?,
                            patient_id: row.get(1)?,
                            user_name: row.get(2)?,
                            last_appointment: row.get(3)?,
                            appointment_count: 1,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut patients: Vec<DoctorPatient> = Vec::new();
        for row in rows {
            match patients.iter_mut().find(|p| p.user_id == row.user_id) {
                Some(existing) => existing.appointment_count += 1,
                None => patients.push(row),
            }
        }
        Ok(patients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::TestConfig;

    fn service() -> (AppointmentService, Database) {
        let config = TestConfig::default().to_app_config();
        let db = Database::open_in_memory().unwrap();
        let security = Arc::new(SecurityServices::new(&config, db.clone()).unwrap());
        (AppointmentService::new(db.clone(), security), db)
    }

    fn request(user_id: &str, doctor_id: Option<i64>) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            user_id: user_id.to_string(),
            doctor_id,
            doctor_name: None,
            department: Some("Cardiology".to_string()),
            user_name: "Alice <b>".to_string(),
            user_email: "alice@example.com".to_string(),
            user_phone: "+1 555 123 4567".to_string(),
            appointment_type: "General".to_string(),
            preferred_date: "2025-03-01".to_string(),
            preferred_time: "Morning".to_string(),
            notes: Some("chest pain".to_string()),
        }
    }

    #[tokio::test]
    async fn stores_encrypted_and_lists_decrypted() {
        let (service, db) = service();
        let id = service.create(request("alice", None)).await.unwrap();

        let (email, notes): (String, String) = db
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT user_email, notes FROM appointments WHERE id = ?1",
                    [id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .await
            .unwrap();
        assert_ne!(email, "alice@example.com");
        assert_ne!(notes, "chest pain");

        let listed = service.list_for_user("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_email, "alice@example.com");
        assert_eq!(listed[0].notes, "chest pain");
        assert_eq!(listed[0].user_name, "Alice &lt;b&gt;");
        assert_eq!(listed[0].status, "pending");
    }

    #[tokio::test]
    async fn unencrypted_rows_are_returned_verbatim() {
        let (service, db) = service();
        db.call(|conn| {
            conn.execute(
                "INSERT INTO appointments (user_id, user_name, user_email, user_phone, appointment_type,
                     preferred_date, preferred_time, notes, status, created_at, is_encrypted)
                 VALUES ('legacy', 'Old', 'old@example.com', '555', 'General', 'd', 't', 'plain', 'pending', 'x', 0)",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let listed = service.list_for_user("legacy").await.unwrap();
        assert_eq!(listed[0].user_email, "old@example.com");
        assert_eq!(listed[0].notes, "plain");
    }

    #[tokio::test]
    async fn missing_appointments_are_not_found() {
        let (service, _) = service();
        assert_matches!(
            service.update_status(42, AppointmentStatus::Accepted).await,
            Err(AppointmentError::NotFound)
        );
        assert_matches!(service.delete(42, "admin").await, Err(AppointmentError::NotFound));
    }

    #[tokio::test]
    async fn doctor_patients_group_accepted_bookings() {
        let (service, _) = service();
        let first = service.create(request("alice", Some(7))).await.unwrap();
        let second = service.create(request("alice", Some(7))).await.unwrap();
        let third = service.create(request("bob", Some(7))).await.unwrap();
        service.create(request("carol", Some(8))).await.unwrap();

        service.update_status(first, AppointmentStatus::Accepted).await.unwrap();
        service.update_status(second, AppointmentStatus::Accepted).await.unwrap();
        service.update_status(third, AppointmentStatus::Rejected).await.unwrap();

        let patients = service.doctor_patients(7).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].user_id, "alice");
        assert_eq!(patients[0].appointment_count, 2);
        assert_eq!(patients[0].patient_id, None);

        let appointments = service.doctor_appointments(7).await.unwrap();
        assert_eq!(appointments.len(), 3);
        assert_eq!(appointments[0].summary.id, third);
    }
}
