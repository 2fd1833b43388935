use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::User,
};

/// Hashes a password into an Argon2id PHC string with a fresh random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Checks a password against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Creates an account
pub async fn register(users: &dyn UserStore, username: &str, password: &str) -> AppResult<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidInput("Username must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".to_string()));
    }

    if users.find_user_by_username(username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let password_hash = hash_password(password)?;
    let user = users.create_user(username, &password_hash).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Registered user");

    Ok(user)
}

/// Verifies credentials, returning the matching account
pub async fn authenticate(users: &dyn UserStore, username: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

    let user = users
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &user.password_hash) {
        tracing::warn!(username = %user.username, "Rejected login with wrong password");
        return Err(invalid());
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockUserStore;
    use crate::models::UserId;
    use mockall::predicate::eq;

    fn stored_user(password: &str) -> User {
        User {
            id: UserId(1),
            username: "alice".to_string(),
            password_hash: hash_password(password).unwrap(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not a hash"));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[tokio::test]
    async fn test_register_trims_username_and_hashes() {
        let mut users = MockUserStore::new();
        users
            .expect_find_user_by_username()
            .with(eq("alice"))
            .returning(|_| Ok(None));
        users
            .expect_create_user()
            .withf(|username, hash| username == "alice" && verify_password("secret", hash))
            .returning(|username, hash| {
                Ok(User {
                    id: UserId(1),
                    username: username.to_string(),
                    password_hash: hash.to_string(),
                })
            });

        let user = register(&users, "  alice ", "secret").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let users = MockUserStore::new();

        assert!(matches!(
            register(&users, "   ", "secret").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            register(&users, "alice", "").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_register_taken_username() {
        let mut users = MockUserStore::new();
        users
            .expect_find_user_by_username()
            .returning(|_| Ok(Some(stored_user("whatever"))));
        users.expect_create_user().times(0);

        assert!(matches!(
            register(&users, "alice", "secret").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let user = stored_user("secret");
        let mut users = MockUserStore::new();
        users
            .expect_find_user_by_username()
            .returning(move |username| Ok((username == "alice").then(|| user.clone())));

        assert_eq!(
            authenticate(&users, "alice", "secret").await.unwrap().id,
            UserId(1)
        );
        assert!(matches!(
            authenticate(&users, "alice", "wrong").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(&users, "mallory", "secret").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
