use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{CurrentUser, RequestId},
    models::RatedBook,
    routes::AppState,
};

/// Handler for the caller's recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    current: CurrentUser,
) -> AppResult<Json<Vec<RatedBook>>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %current.user_id,
        "Processing recommendation request"
    );

    let recommendations = state.recommender.recommend(current.user_id).await?;

    Ok(Json(recommendations))
}
