use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{BookId, RatedBook},
    routes::{AppPath, AppState},
    services::catalog::{self, BookDetail},
};

/// Handler listing the whole catalog, ordered by title
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<RatedBook>>> {
    let books = state.catalog.list_books().await?;
    Ok(Json(books))
}

/// Handler for a single book and its reviews
pub async fn show(
    State(state): State<Arc<AppState>>,
    AppPath(book_id): AppPath<BookId>,
) -> AppResult<Json<BookDetail>> {
    let detail =
        catalog::book_detail(state.catalog.as_ref(), state.reviews.as_ref(), book_id).await?;
    Ok(Json(detail))
}
