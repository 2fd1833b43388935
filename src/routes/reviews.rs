use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{BookId, Review},
    routes::{AppJson, AppPath, AppState},
    services::reviews,
};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub text: Option<String>,
}

/// Handler returning the caller's own review of a book
pub async fn show_own(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    AppPath(book_id): AppPath<BookId>,
) -> AppResult<Json<Review>> {
    state
        .reviews
        .find_review(current.user_id, book_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No review of book {} yet", book_id)))
}

/// Handler creating or editing the caller's review of a book
///
/// Answers 201 when the review is new and 200 when an existing one was edited.
pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    current: CurrentUser,
    AppPath(book_id): AppPath<BookId>,
    AppJson(request): AppJson<ReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %current.user_id,
        book_id = %book_id,
        "Processing review"
    );

    let outcome = reviews::submit_review(
        state.catalog.as_ref(),
        state.reviews.as_ref(),
        current.user_id,
        book_id,
        request.rating,
        request.text,
    )
    .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.review)))
}
