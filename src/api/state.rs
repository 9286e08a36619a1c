use std::sync::Arc;

use crate::calculate::{LeaderboardCache, LeaderboardOptions};
use crate::storage::GameStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GameStore>,
    pub options: Arc<LeaderboardOptions>,
    pub cache: Arc<LeaderboardCache>,
    pub cors_origin: String,
}

impl AppState {
    pub fn new(store: GameStore, options: LeaderboardOptions) -> Self {
        Self {
            store: Arc::new(store),
            options: Arc::new(options),
            cache: Arc::new(LeaderboardCache::new()),
            cors_origin: "*".to_string(),
        }
    }

    /// Builder method to restrict CORS to one origin.
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }
}
