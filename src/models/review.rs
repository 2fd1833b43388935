use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, UserId};
use crate::error::AppError;

/// A star rating between 1 and 5 inclusive
///
/// The only way to build one from untrusted input is `TryFrom<i64>`, so every
/// `Rating` that reaches the store is already in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        i64::from(rating.0)
    }
}

/// One user's review of one book
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Review {
    pub user_id: UserId,
    pub book_id: BookId,
    pub rating: Rating,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review as shown on a book's page, with the reviewer's name
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookReview {
    pub username: String,
    #[serde(flatten)]
    pub review: Review,
}

/// Result of an upsert: the stored review and whether it was newly created
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpsert {
    pub review: Review,
    pub created: bool,
}
