//! Request extractors
//!
//! The identity collaborator authenticates every request upstream and
//! forwards the verified caller as `x-user-id` / `x-user-role` headers.
//! This extractor turns that contract into an `AuthUser`; token mechanics
//! never reach this service.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::models::{AuthUser, UserRole};
use crate::utils::errors::GatherlyError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = GatherlyError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| {
                GatherlyError::PermissionDenied("Missing or invalid user identity".to_string())
            })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                GatherlyError::PermissionDenied("Missing user role".to_string())
            })?
            .parse::<UserRole>()?;

        Ok(AuthUser::new(id, role))
    }
}
