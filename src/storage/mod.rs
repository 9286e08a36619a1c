//! Filesystem snapshot storage.
//!
//! Players and games live in two JSONL files under the data directory.
//! Every mutation rewrites the affected file, so readers always see a
//! full snapshot.

pub mod jsonl;
pub mod store;

pub use jsonl::{EntityType, JsonlReader, JsonlWriter};
pub use store::GameStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::GameId;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Game {0} is finished")]
    Finished(GameId),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.data_dir.join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
