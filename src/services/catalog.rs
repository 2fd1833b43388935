use serde::Serialize;

use crate::{
    db::{CatalogStore, ReviewStore},
    error::{AppError, AppResult},
    models::{BookId, BookReview, RatedBook},
};

/// A book with all of its reviews
#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub book: RatedBook,
    pub reviews: Vec<BookReview>,
}

pub async fn book_detail(
    catalog: &dyn CatalogStore,
    reviews: &dyn ReviewStore,
    book_id: BookId,
) -> AppResult<BookDetail> {
    let book = catalog
        .get_book(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))?;
    let reviews = reviews.reviews_for_book(book_id).await?;

    Ok(BookDetail { book, reviews })
}
