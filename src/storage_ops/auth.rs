use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::storage_ops::handler_utils::AppError;

/// Identity of the already-authenticated caller. Authentication happens
/// upstream; the proxy forwards the verified user id in `x-user-id` and this
/// service trusts it.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedUser {
    pub id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(AppError::AccessDenied)?;
        Ok(Self { id })
    }
}
