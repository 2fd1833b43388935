use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::UserId;

/// Logged-in sessions, keyed by bearer token
///
/// Held in memory only; every session is lost on restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, UserId>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `user_id` and returns its token
    pub async fn create(&self, user_id: UserId) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.write().await.insert(token, user_id);
        token
    }

    pub async fn resolve(&self, token: &Uuid) -> Option<UserId> {
        self.sessions.read().await.get(token).copied()
    }

    /// Ends a session, returning whether it existed
    pub async fn revoke(&self, token: &Uuid) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}
