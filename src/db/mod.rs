//! Persistence for users, the book catalog and reviews.
//!
//! The services only see the store traits below; `SqliteStore` is the
//! production implementation and the traits are mocked in service tests.

use crate::{
    error::AppResult,
    models::{BookId, BookReview, NewBook, Rating, RatedBook, Review, ReviewUpsert, User, UserId},
};

pub mod seed;
pub mod sqlite;
pub mod store;

pub use sqlite::create_pool;
pub use store::SqliteStore;

/// Read access to the book catalog, with derived rating statistics
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// All books ordered by title, each with its average rating and review count
    async fn list_books(&self) -> AppResult<Vec<RatedBook>>;

    async fn get_book(&self, book_id: BookId) -> AppResult<Option<RatedBook>>;

    async fn count_books(&self) -> AppResult<i64>;

    async fn insert_book(&self, book: &NewBook) -> AppResult<BookId>;
}

/// Storage of one review per (user, book) pair
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    async fn reviews_by_user(&self, user_id: UserId) -> AppResult<Vec<Review>>;

    /// Reviews of a book with reviewer names, newest first
    async fn reviews_for_book(&self, book_id: BookId) -> AppResult<Vec<BookReview>>;

    async fn find_review(&self, user_id: UserId, book_id: BookId) -> AppResult<Option<Review>>;

    /// Creates the user's review of the book, or edits it if one already exists
    async fn upsert_review(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: Rating,
        text: Option<String>,
    ) -> AppResult<ReviewUpsert>;
}

/// Account storage
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;
}
