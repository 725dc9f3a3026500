use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::typed_header::{TypedHeader, TypedHeaderRejection};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use security_cell::ClientIp;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;

use crate::models::{LoginRequest, RegisterRequest, RegisterResponse, TokenQuery, UserProfile};
use crate::services::auth::AuthService;

pub async fn register(
    State(service): State<Arc<AuthService>>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let response = service.register(request, &client_ip).await?;
    Ok(Json(response))
}

pub async fn login(
    State(service): State<Arc<AuthService>>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = service.login(request, &client_ip).await?;
    Ok(Json(response))
}

/// Accepts the token as a bearer header or as `?token=`; an unusable header falls back to the query.
pub async fn me(
    State(service): State<Arc<AuthService>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let header_token = match bearer {
        Ok(TypedHeader(auth)) => Some(auth.token().to_string()),
        Err(rejection) => {
            if !rejection.is_missing() {
                debug!("Ignoring authorization header: {}", rejection);
            }
            None
        }
    };

    let token = header_token
        .or(query.token)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    debug!("Resolving current user");
    let profile = service.current_user(&token).await?;
    Ok(Json(profile))
}

pub async fn list_doctors(
    State(service): State<Arc<AuthService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = service.list_doctors().await?;
    Ok(Json(json!({ "doctors": doctors })))
}
