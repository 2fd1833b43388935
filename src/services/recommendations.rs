use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::{CatalogStore, ReviewStore, UserStore},
    error::{AppError, AppResult},
    models::{BookId, RatedBook, Review, UserId},
};

/// Reviews at or above this rating count towards a user's favorite genres
pub const HIGH_RATING_THRESHOLD: u8 = 4;

/// How many favorite genres feed the candidate set
pub const TOP_GENRE_COUNT: usize = 3;

/// Genre-frequency recommender
///
/// Counts the genres of the books a user rated highly, takes the most frequent
/// ones, and suggests the unreviewed books of those genres best rated by
/// everyone. Read-only: it never writes to the stores.
#[derive(Clone)]
pub struct Recommender {
    users: Arc<dyn UserStore>,
    catalog: Arc<dyn CatalogStore>,
    reviews: Arc<dyn ReviewStore>,
    limit: Option<usize>,
}

impl Recommender {
    pub fn new(
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
        reviews: Arc<dyn ReviewStore>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            users,
            catalog,
            reviews,
            limit,
        }
    }

    /// Recommended books for `user_id`, best average rating first
    ///
    /// Empty when the user has no review rated 4 or higher. Fails with
    /// `NotFound` when the user does not exist.
    pub async fn recommend(&self, user_id: UserId) -> AppResult<Vec<RatedBook>> {
        if self.users.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let user_reviews = self.reviews.reviews_by_user(user_id).await?;
        if !user_reviews.iter().any(is_high_rated) {
            tracing::debug!(user_id = %user_id, "No high-rated reviews, nothing to recommend");
            return Ok(Vec::new());
        }

        let catalog = self.catalog.list_books().await?;
        let recommendations = rank_recommendations(&user_reviews, &catalog, self.limit);

        tracing::info!(
            user_id = %user_id,
            reviewed = user_reviews.len(),
            recommended = recommendations.len(),
            "Computed recommendations"
        );

        Ok(recommendations)
    }
}

fn is_high_rated(review: &Review) -> bool {
    review.rating.value() >= HIGH_RATING_THRESHOLD
}

/// The user's most frequent genres among high-rated reviews
///
/// Ordered by count descending, ties by genre name ascending, at most
/// `TOP_GENRE_COUNT` entries. Reviews of books missing from `catalog` are ignored.
pub fn favorite_genres(user_reviews: &[Review], catalog: &[RatedBook]) -> Vec<String> {
    let genre_by_book: HashMap<BookId, &str> = catalog
        .iter()
        .map(|book| (book.id, book.genre.as_str()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for review in user_reviews.iter().filter(|r| is_high_rated(r)) {
        if let Some(genre) = genre_by_book.get(&review.book_id) {
            *counts.entry(*genre).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_GENRE_COUNT)
        .map(|(genre, _)| genre.to_string())
        .collect()
}

/// Ranks the catalog for a user given all of that user's reviews
///
/// Candidates are books in a favorite genre the user has not reviewed at any
/// rating. They are sorted by average rating descending (unreviewed books
/// count as 0.0), then by book id ascending, and optionally truncated.
pub fn rank_recommendations(
    user_reviews: &[Review],
    catalog: &[RatedBook],
    limit: Option<usize>,
) -> Vec<RatedBook> {
    let genres = favorite_genres(user_reviews, catalog);
    if genres.is_empty() {
        return Vec::new();
    }

    let reviewed: HashSet<BookId> = user_reviews.iter().map(|r| r.book_id).collect();

    let mut candidates: Vec<RatedBook> = catalog
        .iter()
        .filter(|book| genres.contains(&book.genre) && !reviewed.contains(&book.id))
        .cloned()
        .collect();

    candidates.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.id.cmp(&b.id))
    });

    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    candidates
}
