// =====================================================================================
// AUDIT SERVICE - SECURITY EVENT LOGGING
// =====================================================================================

use rusqlite::params;
use tracing::{error, info, instrument, warn};

use shared_database::{now_timestamp, Database, DatabaseError};

use crate::models::{AuditEntry, SecurityLog, Severity};

pub struct AuditService {
    db: Database,
}

impl AuditService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Emits the event on the `security` tracing target and appends it to `security_logs`.
    ///
    /// Storage failures are logged and swallowed so auditing never fails the request.
    #[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
    pub async fn log(&self, entry: AuditEntry) {
        self.log_to_tracing(&entry);

        if let Err(e) = self.persist(&entry).await {
            warn!(target: "security", "Failed to persist audit entry {}: {}", entry.event_type, e);
        }
    }

    fn log_to_tracing(&self, entry: &AuditEntry) {
        let details = entry.details.as_deref().unwrap_or("");
        match entry.severity {
            Severity::Info => info!(
                target: "security",
                user_id = %entry.actor(),
                ip_address = ?entry.ip_address,
                "[{}] User: {} - {}", entry.event_type, entry.actor(), details
            ),
            Severity::Warning => warn!(
                target: "security",
                user_id = %entry.actor(),
                ip_address = ?entry.ip_address,
                "[{}] User: {} - {}", entry.event_type, entry.actor(), details
            ),
            Severity::Error | Severity::Critical => error!(
                target: "security",
                user_id = %entry.actor(),
                ip_address = ?entry.ip_address,
                severity = %entry.severity,
                "[{}] User: {} - {}", entry.event_type, entry.actor(), details
            ),
        }
    }

    async fn persist(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        let event_type = entry.event_type.as_str().to_string();
        let user_id = entry.actor().to_string();
        let ip_address = entry.ip_address.clone();
        let details = entry.details.clone();
        let severity = entry.severity.as_str().to_string();

        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO security_logs (event_type, user_id, ip_address, details, severity, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![event_type, user_id, ip_address, details, severity, now_timestamp()],
                )?;
                Ok(())
            })
            .await
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<SecurityLog>, DatabaseError> {
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, event_type, user_id, ip_address, details, severity, created_at
                     FROM security_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map([limit as i64], |row| {
                        Ok(SecurityLog {
                            id: row.get(0)?,
                            event_type: row.get(1)?,
                            user_id: row.get(2)?,
                            ip_address: row.get(3)?,
                            details: row.get(4)?,
                            severity: row.get(5)?,
                            created_at: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}
