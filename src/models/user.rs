use serde::Serialize;

use super::UserId;

/// A registered account
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2id PHC string, never sent to clients
    #[serde(skip)]
    pub password_hash: String,
}
