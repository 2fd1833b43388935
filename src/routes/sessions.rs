use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::User,
    routes::{users::Credentials, AppJson, AppState},
    services::accounts,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: User,
}

/// Handler for login; issues a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let user = accounts::authenticate(
        state.users.as_ref(),
        &credentials.username,
        &credentials.password,
    )
    .await?;
    let token = state.sessions.create(user.id).await;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((StatusCode::CREATED, Json(LoginResponse { token, user })))
}

/// Handler for logout; revokes the presented token
pub async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> StatusCode {
    state.sessions.revoke(&current.token).await;
    tracing::info!(user_id = %current.user_id, "User logged out");
    StatusCode::NO_CONTENT
}
