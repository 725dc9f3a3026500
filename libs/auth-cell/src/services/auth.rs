// libs/auth-cell/src/services/auth.rs
use std::sync::Arc;

use tracing::{info, instrument, warn};

use security_cell::{AuditEntry, AuditEventType, PasswordSecurityService, SecurityServices, Severity};
use shared_config::AppConfig;
use shared_database::Database;
use shared_models::auth::{Role, TokenResponse};
use shared_utils::jwt::{create_token, validate_token};

use crate::models::{
    AuthError, DoctorSummary, LoginRequest, NewUser, RegisterRequest, RegisterResponse, UserProfile,
    UserRecord,
};
use crate::services::user::UserRepository;

const USERNAME_MAX_LEN: usize = 50;
const EMAIL_MAX_LEN: usize = 100;
const SPECIALTY_MAX_LEN: usize = 100;

pub struct AuthService {
    config: Arc<AppConfig>,
    users: UserRepository,
    security: Arc<SecurityServices>,
}

impl AuthService {
    pub fn new(config: Arc<AppConfig>, db: Database, security: Arc<SecurityServices>) -> Self {
        Self {
            config,
            users: UserRepository::new(db),
            security,
        }
    }

    fn issue_token(&self, user: &UserRecord) -> Result<TokenResponse, AuthError> {
        let role = user.effective_role();
        let token = create_token(user.id, &user.username, role, &self.config.jwt_secret)
            .map_err(AuthError::Token)?;
        Ok(TokenResponse::bearer(token, user.username.clone(), role))
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        request: RegisterRequest,
        client_ip: &str,
    ) -> Result<RegisterResponse, AuthError> {
        let validation = &self.security.validation;
        validation.validate_username(&request.username)?;
        validation.validate_password(&request.password)?;

        let email = request.email.as_deref().filter(|e| !e.is_empty());
        if let Some(email) = email {
            validation.validate_email(email)?;
        }

        let username = validation.sanitize_input(&request.username, USERNAME_MAX_LEN);
        let email = email.map(|e| validation.sanitize_input(e, EMAIL_MAX_LEN));
        let role = request.requested_role();
        let specialty = match role {
            Role::Doctor => request
                .specialty
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| validation.sanitize_input(s, SPECIALTY_MAX_LEN)),
            _ => None,
        };

        let hashed_password = PasswordSecurityService::hash_password_async(request.password.clone()).await?;

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                hashed_password,
                role,
                specialty,
                is_admin: false,
            })
            .await?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::UserRegistered)
                    .with_user(&user.username)
                    .with_ip(client_ip)
                    .with_details(format!("IP: {}", client_ip)),
            )
            .await;
        info!("New user registered: {}", user.username);

        Ok(RegisterResponse {
            status: "success".to_string(),
            message: "Registration successful".to_string(),
            token: self.issue_token(&user)?,
        })
    }

    /// Every attempt counts against the throttle; only a successful login resets it.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest, client_ip: &str) -> Result<TokenResponse, AuthError> {
        let throttled = self
            .security
            .login_throttle
            .lock()
            .await
            .record_attempt(&request.username);

        if let Err(e) = throttled {
            self.security
                .audit
                .log(
                    AuditEntry::new(AuditEventType::AccountLocked)
                        .with_user(&request.username)
                        .with_ip(client_ip)
                        .with_details(format!("IP: {}", client_ip))
                        .with_severity(Severity::Warning),
                )
                .await;
            return Err(e.into());
        }

        let verified = match self.users.find_by_username(&request.username).await? {
            Some(user) => {
                let matches = PasswordSecurityService::verify_password_async(
                    request.password.clone(),
                    user.hashed_password.clone(),
                )
                .await?;
                matches.then_some(user)
            }
            None => None,
        };

        let user = match verified {
            Some(user) => user,
            None => {
                self.security
                    .audit
                    .log(
                        AuditEntry::new(AuditEventType::LoginFailed)
                            .with_user(&request.username)
                            .with_ip(client_ip)
                            .with_details(format!("IP: {}", client_ip))
                            .with_severity(Severity::Warning),
                    )
                    .await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.security.login_throttle.lock().await.clear(&request.username);
        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::LoginSuccess)
                    .with_user(&user.username)
                    .with_ip(client_ip)
                    .with_details(format!("IP: {}", client_ip)),
            )
            .await;
        info!("User logged in: {}", user.username);

        self.issue_token(&user)
    }

    pub async fn current_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        let caller = validate_token(token, &self.config.jwt_secret).map_err(|e| {
            warn!("Rejected token: {}", e);
            AuthError::InvalidToken
        })?;

        self.users
            .find_by_id(caller.id)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, AuthError> {
        Ok(self.users.list_doctors().await?)
    }

    /// Creates the configured administrator account when it does not exist yet.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Ok(());
        }

        let hashed_password = PasswordSecurityService::hash_password_async(password.to_string()).await?;
        self.users
            .create(NewUser {
                username: username.to_string(),
                email: None,
                hashed_password,
                role: Role::Admin,
                specialty: None,
                is_admin: true,
            })
            .await?;
        info!("Created admin account: {}", username);
        Ok(())
    }
}
