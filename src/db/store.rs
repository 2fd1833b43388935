use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{CatalogStore, ReviewStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{BookId, BookReview, NewBook, Rating, RatedBook, Review, ReviewUpsert, User, UserId},
};

const RATED_BOOK_COLUMNS: &str = "
    SELECT
        b.id,
        b.title,
        b.author,
        b.genre,
        b.description,
        COALESCE(AVG(r.rating), 0.0) AS average_rating,
        COUNT(r.id) AS review_count
    FROM books b
    LEFT JOIN reviews r ON r.book_id = b.id";

const REVIEW_COLUMNS: &str = "user_id, book_id, rating, review_text, created_at, updated_at";

/// Raw review row; the rating is range-checked when converted into a `Review`
#[derive(sqlx::FromRow)]
struct ReviewRow {
    user_id: UserId,
    book_id: BookId,
    rating: i64,
    review_text: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::try_from(row.rating).map_err(|_| {
            AppError::Internal(format!(
                "Stored rating {} out of range for user {} book {}",
                row.rating, row.user_id, row.book_id
            ))
        })?;

        Ok(Review {
            user_id: row.user_id,
            book_id: row.book_id,
            rating,
            text: row.review_text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookReviewRow {
    username: String,
    #[sqlx(flatten)]
    review: ReviewRow,
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}

/// SQLite-backed implementation of every store trait
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl CatalogStore for SqliteStore {
    async fn list_books(&self) -> AppResult<Vec<RatedBook>> {
        let query = format!("{RATED_BOOK_COLUMNS} GROUP BY b.id ORDER BY b.title ASC, b.id ASC");
        let books = sqlx::query_as::<_, RatedBook>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_book(&self, book_id: BookId) -> AppResult<Option<RatedBook>> {
        let query = format!("{RATED_BOOK_COLUMNS} WHERE b.id = ? GROUP BY b.id");
        let book = sqlx::query_as::<_, RatedBook>(&query)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn count_books(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<BookId> {
        let id = sqlx::query_scalar(
            "INSERT INTO books (title, author, genre, description) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl ReviewStore for SqliteStore {
    async fn reviews_by_user(&self, user_id: UserId) -> AppResult<Vec<Review>> {
        let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = ? ORDER BY book_id");
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Review::try_from)
            .collect()
    }

    async fn reviews_for_book(&self, book_id: BookId) -> AppResult<Vec<BookReview>> {
        let rows = sqlx::query_as::<_, BookReviewRow>(
            "SELECT u.username, r.user_id, r.book_id, r.rating, r.review_text, r.created_at, r.updated_at
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.book_id = ?
             ORDER BY r.id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BookReview {
                    username: row.username,
                    review: Review::try_from(row.review)?,
                })
            })
            .collect()
    }

    async fn find_review(&self, user_id: UserId, book_id: BookId) -> AppResult<Option<Review>> {
        let query =
            format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = ? AND book_id = ?");
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(user_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Review::try_from)
            .transpose()
    }

    async fn upsert_review(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: Rating,
        text: Option<String>,
    ) -> AppResult<ReviewUpsert> {
        // A single write statement takes the write lock up front, so concurrent
        // upserts wait on the busy timeout instead of deadlocking on a lock upgrade.
        let now = Utc::now();
        let query = format!(
            "INSERT INTO reviews (user_id, book_id, rating, review_text, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, book_id) DO UPDATE SET
                 rating = excluded.rating,
                 review_text = excluded.review_text,
                 updated_at = excluded.updated_at
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(user_id)
            .bind(book_id)
            .bind(i64::from(rating))
            .bind(&text)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        // An edited row keeps the creation time of the earlier write
        let created = row.created_at == row.updated_at;

        tracing::debug!(
            user_id = %user_id,
            book_id = %book_id,
            rating = rating.value(),
            created,
            "Review stored"
        );

        Ok(ReviewUpsert {
            review: Review::try_from(row)?,
            created,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES (?, ?)
             RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Username '{}' is already taken", username))
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn create_test_store() -> SqliteStore {
        let pool = create_pool("sqlite::memory:", 1)
            .await
            .expect("Failed to create in-memory database");
        SqliteStore::new(pool)
    }

    fn rating(value: i64) -> Rating {
        Rating::try_from(value).unwrap()
    }

    async fn add_book(store: &SqliteStore, title: &str, genre: &str) -> BookId {
        store
            .insert_book(&NewBook::new(title, "Author", genre, "Description"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = create_test_store().await;

        let user = store.create_user("alice", "hash").await.unwrap();
        assert_eq!(user.username, "alice");

        let by_name = store.find_user_by_username("alice").await.unwrap();
        assert_eq!(by_name, Some(user.clone()));

        let by_id = store.find_user(user.id).await.unwrap();
        assert_eq!(by_id, Some(user));

        assert_eq!(store.find_user(UserId(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let store = create_test_store().await;
        store.create_user("alice", "hash").await.unwrap();

        let result = store.create_user("alice", "other").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_books_without_reviews_average_zero() {
        let store = create_test_store().await;
        let id = add_book(&store, "Dune", "Sci-Fi").await;

        let book = store.get_book(id).await.unwrap().unwrap();
        assert_eq!(book.average_rating, 0.0);
        assert_eq!(book.review_count, 0);
        assert_eq!(store.get_book(BookId(404)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_books_sorted_by_title_with_averages() {
        let store = create_test_store().await;
        let zebra = add_book(&store, "Zebra", "Nature").await;
        let apple = add_book(&store, "Apple", "Food").await;
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();

        store
            .upsert_review(alice.id, zebra, rating(5), None)
            .await
            .unwrap();
        store
            .upsert_review(bob.id, zebra, rating(2), None)
            .await
            .unwrap();

        let books = store.list_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, apple);
        assert_eq!(books[1].id, zebra);
        assert_eq!(books[1].average_rating, 3.5);
        assert_eq!(books[1].review_count, 2);
        assert_eq!(store.count_books().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_edits_existing_review() {
        let store = create_test_store().await;
        let book = add_book(&store, "Dune", "Sci-Fi").await;
        let user = store.create_user("alice", "hash").await.unwrap();

        let first = store
            .upsert_review(user.id, book, rating(3), Some("Fine".to_string()))
            .await
            .unwrap();
        assert!(first.created);

        let second = store
            .upsert_review(user.id, book, rating(5), Some("Great on reread".to_string()))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.review.rating, rating(5));
        assert_eq!(second.review.text.as_deref(), Some("Great on reread"));
        assert_eq!(second.review.created_at, first.review.created_at);
        assert!(second.review.updated_at >= first.review.updated_at);

        let reviews = store.reviews_by_user(user.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(
            store.find_review(user.id, book).await.unwrap(),
            Some(second.review)
        );
    }

    #[tokio::test]
    async fn test_reviews_for_book_newest_first_with_usernames() {
        let store = create_test_store().await;
        let book = add_book(&store, "Dune", "Sci-Fi").await;
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();

        store
            .upsert_review(alice.id, book, rating(4), None)
            .await
            .unwrap();
        store
            .upsert_review(bob.id, book, rating(1), Some("Too long".to_string()))
            .await
            .unwrap();

        let reviews = store.reviews_for_book(book).await.unwrap();
        let names: Vec<&str> = reviews.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice"]);
        assert_eq!(reviews[0].review.rating, rating(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_on_file_database() {
        let path = std::env::temp_dir().join(format!("reviews-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());
        let pool = create_pool(&url, 5).await.unwrap();
        let store = SqliteStore::new(pool.clone());

        let book = add_book(&store, "Dune", "Sci-Fi").await;
        let alice = store.create_user("alice", "hash").await.unwrap();

        // Same user and book from several connections at once
        let mut tasks = Vec::new();
        for value in 1..=6 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .upsert_review(alice.id, book, rating(value % 5 + 1), None)
                    .await
            }));
        }
        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().created {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        // Different users reviewing the same book
        let mut tasks = Vec::new();
        for n in 0..6 {
            let user = store.create_user(&format!("reader{}", n), "hash").await.unwrap();
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.upsert_review(user.id, book, rating(4), None).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().created);
        }

        assert_eq!(store.reviews_for_book(book).await.unwrap().len(), 7);

        pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_schema_rejects_out_of_range_rating() {
        let store = create_test_store().await;
        let book = add_book(&store, "Dune", "Sci-Fi").await;
        let user = store.create_user("alice", "hash").await.unwrap();

        let result = sqlx::query(
            "INSERT INTO reviews (user_id, book_id, rating, created_at, updated_at)
             VALUES (?, ?, 9, ?, ?)",
        )
        .bind(user.id)
        .bind(book)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(store.pool())
        .await;

        assert!(result.is_err());
    }
}
