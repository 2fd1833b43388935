use std::sync::Arc;

use crate::{
    db::{CatalogStore, ReviewStore, SqliteStore, UserStore},
    services::{Recommender, SessionStore},
};

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionStore,
    pub recommender: Recommender,
}

impl AppState {
    /// Wires every store trait to the same SQLite store
    pub fn new(store: SqliteStore, recommendation_limit: Option<usize>) -> Self {
        let store = Arc::new(store);
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let reviews: Arc<dyn ReviewStore> = store.clone();
        let users: Arc<dyn UserStore> = store;

        let recommender = Recommender::new(
            users.clone(),
            catalog.clone(),
            reviews.clone(),
            recommendation_limit,
        );

        Self {
            catalog,
            reviews,
            users,
            sessions: SessionStore::new(),
            recommender,
        }
    }
}
