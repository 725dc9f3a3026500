// libs/auth-cell/src/services/user.rs
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use shared_database::{now_timestamp, Database, DatabaseError};
use shared_models::auth::Role;

use crate::models::{AuthError, DoctorSummary, NewUser, UserRecord};

const USER_COLUMNS: &str =
    "id, username, email, hashed_password, role, specialty, is_admin, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role: String = row.get(4)?;
    let is_admin: i64 = row.get(6)?;
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        hashed_password: row.get(3)?,
        role: role.parse().unwrap_or_default(),
        specialty: row.get(5)?,
        is_admin: is_admin != 0,
        created_at: row.get(7)?,
    })
}

fn select_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<UserRecord>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        [username],
        user_from_row,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Access to the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts the user; a username or email that is already taken yields
    /// [`AuthError::UsernameTaken`].
    pub async fn create(&self, user: NewUser) -> Result<UserRecord, AuthError> {
        let created = self
            .db
            .call(move |conn| {
                if select_by_username(conn, &user.username)?.is_some() {
                    return Ok(None);
                }

                let inserted = conn.execute(
                    "INSERT INTO users (username, email, hashed_password, role, specialty, is_admin, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        user.username,
                        user.email,
                        user.hashed_password,
                        user.role.as_str(),
                        user.specialty,
                        user.is_admin as i64,
                        now_timestamp()
                    ],
                );
                match inserted {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => return Ok(None),
                    Err(e) => return Err(e.into()),
                }

                Ok(select_by_username(conn, &user.username)?)
            })
            .await?;

        created.ok_or(AuthError::UsernameTaken)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let username = username.to_string();
        self.db
            .call(move |conn| Ok(select_by_username(conn, &username)?))
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
        self.db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                        [id],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// Doctors in registration order; a missing specialty is reported as `General`.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, DatabaseError> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, specialty FROM users WHERE role = ?1 ORDER BY id",
                )?;
                let doctors = stmt
                    .query_map([Role::Doctor.as_str()], |row| {
                        let specialty: Option<String> = row.get(2)?;
                        Ok(DoctorSummary {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            specialty: specialty
                                .filter(|s| !s.is_empty())
                                .unwrap_or_else(|| "General".to_string()),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("Found {} doctors", doctors.len());
                Ok(doctors)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_user(username: &str, email: Option<&str>, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.map(str::to_string),
            hashed_password: "hash".to_string(),
            role,
            specialty: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let repo = UserRepository::new(Database::open_in_memory().unwrap());

        let first = repo
            .create(new_user("alice", Some("a@example.com"), Role::Patient))
            .await
            .unwrap();
        assert_eq!(first.username, "alice");
        assert!(!first.is_admin);

        assert_matches!(
            repo.create(new_user("alice", None, Role::Patient)).await,
            Err(AuthError::UsernameTaken)
        );
        assert_matches!(
            repo.create(new_user("alicia", Some("a@example.com"), Role::Patient)).await,
            Err(AuthError::UsernameTaken)
        );
    }

    #[tokio::test]
    async fn users_without_email_do_not_collide() {
        let repo = UserRepository::new(Database::open_in_memory().unwrap());
        repo.create(new_user("one", None, Role::Patient)).await.unwrap();
        repo.create(new_user("two", None, Role::Patient)).await.unwrap();

        let found = repo.find_by_username("two").await.unwrap().unwrap();
        assert_eq!(repo.find_by_id(found.id).await.unwrap().unwrap().username, "two");
        assert!(repo.find_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_only_doctors() {
        let repo = UserRepository::new(Database::open_in_memory().unwrap());
        repo.create(new_user("pat", None, Role::Patient)).await.unwrap();
        let mut doc = new_user("house", None, Role::Doctor);
        doc.specialty = Some("Cardiology".to_string());
        repo.create(doc).await.unwrap();
        repo.create(new_user("grey", None, Role::Doctor)).await.unwrap();

        let doctors = repo.list_doctors().await.unwrap();
        assert_eq!(doctors.len(), 2);
        assert_eq!(doctors[0].specialty, "Cardiology");
        assert_eq!(doctors[1].specialty, "General");
    }
}
