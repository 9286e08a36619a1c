//! Derived statistics models.
//!
//! Everything here is recomputed from player and game snapshots on demand
//! and never persisted.

use serde::{Deserialize, Serialize};

use super::Player;

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStat {
    pub player: Player,

    /// Completed games the player took part in
    pub games_played: u32,

    /// Rounds counted for the player, including zero-filled ones
    pub rounds_played: u32,

    /// Sum of per-round penalty points
    pub total_score: f64,

    /// Raw mean per round (0 with no rounds)
    pub avg_per_round: f64,

    /// Mean per round shrunk toward the global mean
    pub adj_avg_per_round: f64,

    /// Higher-is-better inverse of `adj_avg_per_round`
    pub rating: f64,

    /// Below the configured sample-size thresholds
    pub provisional: bool,
}

/// Career totals for a single player, across games in any state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub total_score: f64,
    pub games_played: u32,
    pub wins: u32,
    /// Rounds with a recorded entry for the player
    pub rounds_played: u32,
    pub avg_score_per_game: f64,
    pub avg_score_per_round: f64,
}

/// A participant's line in a single game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBreakdown {
    pub player: Player,
    pub total: f64,
    /// Total divided by the number of rounds in the game
    pub avg: f64,
    /// Lowest recorded round score
    pub best: f64,
    /// Highest recorded round score
    pub worst: f64,
}

/// Cumulative totals after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRow {
    /// Round label (`R1`, `R2`, ...)
    pub round: String,
    /// `(player name, running total)` for players who have scored so far
    pub totals: Vec<(String, f64)>,
}

/// Summary of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub winner: Option<Player>,
    pub rounds: u32,
    pub total_points: f64,
    pub average_per_player: f64,
    /// Sorted ascending by total
    pub standings: Vec<PlayerBreakdown>,
    pub progression: Vec<ProgressionRow>,
}
