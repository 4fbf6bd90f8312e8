//! Bearer-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use tenderbox_core::Actor;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor that requires a resolvable bearer token.
///
/// ```ignore
/// async fn handler(RequireActor(actor): RequireActor) -> impl IntoResponse { .. }
/// ```
#[derive(Debug, Clone)]
pub struct RequireActor(pub Actor);

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(ApiError::Unauthorized("Authentication required".to_string()));
        };

        match state.actors.resolve(token).await? {
            Some(actor) => {
                debug!(subsystem = "api", actor_uid = %actor.uid, role = %actor.role, "Authenticated");
                Ok(RequireActor(actor))
            }
            None => Err(ApiError::Unauthorized("Invalid or expired token".to_string())),
        }
    }
}
