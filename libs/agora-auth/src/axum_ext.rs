//! Axum extractors and middleware for auth

use std::sync::Arc;

use agora_security::SecurityContext;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AuthError;
use crate::traits::TokenValidator;

/// Extractor for `SecurityContext` - validates that auth middleware has run
#[derive(Debug, Clone)]
pub struct Authz(pub SecurityContext);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .copied()
            .map(Authz)
            .ok_or_else(|| {
                AuthError::Internal(
                    "SecurityContext not found - auth middleware not configured".to_owned(),
                )
            })
    }
}

/// Middleware requiring a valid bearer token on every request.
///
/// CORS preflight requests pass through unauthenticated.
pub async fn auth_required(
    State(validator): State<Arc<dyn TokenValidator>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight_request(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        return AuthError::Unauthenticated.into_response();
    };

    let ctx = match validator.validate(token).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::debug!(error = %err, "rejected bearer token");
            return err.into_response();
        }
    };

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Check if this is a CORS preflight request
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
