use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Validates the caller's token and stores the resulting [`User`] in the request extensions.
///
/// The token is read from `Authorization: Bearer ...`, falling back to a `token`
/// query parameter for clients that cannot set headers.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)?;

    let user = validate_token(&token, &config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_token<B>(request: &Request<B>) -> Result<String, AppError> {
    if let Some(auth_header) = request.headers().get("Authorization") {
        let auth_value = auth_header
            .to_str()
            .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

        return auth_value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()));
    }

    request
        .uri()
        .query()
        .and_then(token_from_query)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))
}

fn token_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| *key == "token" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn reads_bearer_header() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .unwrap();
        assert_eq!(extract_token(&request).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn falls_back_to_query_parameter() {
        let request = Request::builder()
            .uri("/auth/me?foo=1&token=abc.def.ghi")
            .body(())
            .unwrap();
        assert_eq!(extract_token(&request).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let request = Request::builder()
            .header("Authorization", "Basic xyz")
            .body(())
            .unwrap();
        assert_matches!(extract_token(&request), Err(AppError::Auth(_)));
    }

    #[test]
    fn missing_token_is_auth_error() {
        let request = Request::builder().uri("/auth/me").body(()).unwrap();
        assert_matches!(extract_token(&request), Err(AppError::Auth(_)));
    }
}
