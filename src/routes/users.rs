use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::User,
    routes::{AppJson, AppState},
    services::accounts,
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Handler for account registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<(StatusCode, Json<User>)> {
    tracing::info!(
        request_id = %request_id,
        username = %credentials.username,
        "Processing registration"
    );

    let user = accounts::register(
        state.users.as_ref(),
        &credentials.username,
        &credentials.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
