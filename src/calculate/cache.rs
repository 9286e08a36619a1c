//! Memoized leaderboard.
//!
//! Snapshots arrive whole on every change, so the cache keeps only the most
//! recent result, keyed on a content hash of the inputs.

use std::sync::Mutex;

use tracing::debug;

use super::leaderboard::{compute_leaderboard, LeaderboardOptions};
use crate::models::{EntityId, Game, LeaderboardStat, Player};

#[derive(Debug, Default)]
pub struct LeaderboardCache {
    last: Mutex<Option<(EntityId, Vec<LeaderboardStat>)>>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content key for a set of inputs.
    pub fn key(players: &[Player], games: &[Game], options: &LeaderboardOptions) -> EntityId {
        let players = serde_json::to_string(players).unwrap_or_default();
        let games = serde_json::to_string(games).unwrap_or_default();
        let options = serde_json::to_string(options).unwrap_or_default();
        EntityId::generate(&[&players, &games, &options])
    }

    /// Return the cached leaderboard for these inputs, computing it on a miss.
    pub fn get_or_compute(
        &self,
        players: &[Player],
        games: &[Game],
        options: &LeaderboardOptions,
    ) -> Vec<LeaderboardStat> {
        let key = Self::key(players, games, options);

        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((cached_key, rows)) = last.as_ref() {
            if *cached_key == key {
                debug!(%key, "Leaderboard cache hit");
                return rows.clone();
            }
        }

        let rows = compute_leaderboard(players, games, options);
        *last = Some((key, rows.clone()));
        rows
    }

    /// Key of the cached result, if any.
    pub fn cached_key(&self) -> Option<EntityId> {
        let last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last.as_ref().map(|(key, _)| key.clone())
    }
}
