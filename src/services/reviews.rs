use crate::{
    db::{CatalogStore, ReviewStore},
    error::{AppError, AppResult},
    models::{BookId, Rating, ReviewUpsert, UserId},
};

/// Creates or edits `user_id`'s review of `book_id`
///
/// The rating is validated here, before anything reaches the store. Blank
/// review text is stored as no text.
pub async fn submit_review(
    catalog: &dyn CatalogStore,
    reviews: &dyn ReviewStore,
    user_id: UserId,
    book_id: BookId,
    rating: i64,
    text: Option<String>,
) -> AppResult<ReviewUpsert> {
    let rating = Rating::try_from(rating)?;

    if catalog.get_book(book_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Book {} not found", book_id)));
    }

    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let outcome = reviews.upsert_review(user_id, book_id, rating, text).await?;

    tracing::info!(
        user_id = %user_id,
        book_id = %book_id,
        rating = rating.value(),
        created = outcome.created,
        "Review submitted"
    );

    Ok(outcome)
}
