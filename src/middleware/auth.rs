use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{error::AppError, models::UserId, routes::AppState};

/// The logged-in user, resolved from an `Authorization: Bearer <token>` header
///
/// Handlers take this as an argument instead of reading any global login state.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub token: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t.trim()).ok())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing or malformed bearer token".to_string()))?;

        let user_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Unknown or expired session".to_string()))?;

        Ok(Self { user_id, token })
    }
}
