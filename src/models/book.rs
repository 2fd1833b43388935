use serde::{Deserialize, Serialize};

use super::BookId;

/// A catalog book together with its derived rating statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct RatedBook {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Single genre label, the only feature used for recommendations
    pub genre: String,
    pub description: Option<String>,
    /// Mean of all review ratings, 0.0 when the book has no reviews
    pub average_rating: f64,
    pub review_count: i64,
}

/// A book to be inserted into the catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
}

impl NewBook {
    pub fn new(title: &str, author: &str, genre: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            description: Some(description.to_string()),
        }
    }
}
