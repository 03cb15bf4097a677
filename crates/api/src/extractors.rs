//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use polling_common::AppError;
use polling_core::Actor;
use polling_db::entities::user;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .map(|user| Self(Actor::from(user)))
            .ok_or(AppError::Unauthorized)
    }
}
