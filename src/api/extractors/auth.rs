use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Identity of the caller. Session handling lives in the upstream
/// gateway, which forwards the authenticated user id in a trusted
/// header; a request without one is unauthenticated.
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser(user_id.to_string()))
    }
}
