use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Extensions, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_models::error::AppError;

use crate::models::{AuditEntry, AuditEventType, Severity};
use crate::SecurityServices;

const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("cache-control", "no-store, no-cache, must-revalidate"),
    ("pragma", "no-cache"),
];

/// Per-client rate limiting plus the standard hardening headers on every response.
pub async fn security_middleware(
    State(security): State<Arc<SecurityServices>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = client_ip(&request);
    let path = request.uri().path().to_string();

    let allowed = security.rate_limiter.lock().await.check(&client_ip);

    let mut response = match allowed {
        Ok(()) => next.run(request).await,
        Err(e) => {
            security
                .audit
                .log(
                    AuditEntry::new(AuditEventType::RateLimitExceeded)
                        .with_user(client_ip.clone())
                        .with_ip(client_ip)
                        .with_details(format!("Path: {}", path))
                        .with_severity(Severity::Warning),
                )
                .await;
            AppError::from(e).into_response()
        }
    };

    apply_security_headers(&mut response);
    response
}

pub fn client_ip<B>(request: &Request<B>) -> String {
    ip_from_extensions(request.extensions())
}

fn ip_from_extensions(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Caller address for handlers that audit; `unknown` without connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(ip_from_extensions(&parts.extensions)))
    }
}

fn apply_security_headers(response: &mut Response) {
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}
