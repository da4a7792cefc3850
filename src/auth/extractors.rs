use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{claims::Identity, jwt::TokenKeys};
use crate::error::AppError;

/// Extracts and validates the bearer token, yielding the caller's identity.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("Missing token".into()))?;

        // Expect "Bearer <token>"
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization header".into()))?;

        let keys = TokenKeys::from_ref(state);
        match keys.verify(token) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e) => {
                warn!(error = %e, "rejected bearer token");
                Err(AppError::Unauthenticated("Invalid or expired token".into()))
            }
        }
    }
}
