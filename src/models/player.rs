//! Player profile model.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A signed-in player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Avatar URI
    #[serde(default)]
    pub avatar: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: String::new(),
        }
    }

    /// Builder method to set the avatar URI.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }
}
