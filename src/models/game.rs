//! Game, round and score models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GameId, PlayerId, RoundId};

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameState {
    /// Players may join or leave and rounds may be appended
    #[default]
    Ongoing,
    /// Immutable except for deletion
    Finished,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameState::Ongoing => write!(f, "Ongoing"),
            GameState::Finished => write!(f, "Finished"),
        }
    }
}

/// Per-player settings within a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOption {
    pub id: PlayerId,
    pub average_enabled: bool,
}

/// One player's penalty points for a round. Lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub player_id: PlayerId,
    pub score: f64,
}

impl Score {
    pub fn new(player_id: impl Into<PlayerId>, score: f64) -> Self {
        Self {
            player_id: player_id.into(),
            score,
        }
    }
}

/// A recorded round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scores: Vec<Score>,
}

impl Round {
    pub fn new(scores: Vec<Score>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RoundId::random(),
            created_at,
            scores,
        }
    }

    /// The recorded score for a player, if the round has an entry for them.
    pub fn score_for(&self, player_id: &PlayerId) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| &s.player_id == player_id)
            .map(|s| s.score)
    }

    /// Mean of the finite recorded scores, 0 when the round has none.
    pub fn mean_score(&self) -> f64 {
        let finite: Vec<f64> = self
            .scores
            .iter()
            .map(|s| s.score)
            .filter(|s| s.is_finite())
            .collect();
        if finite.is_empty() {
            return 0.0;
        }
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}

/// A game of UNO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,

    /// Player who created the game
    pub host_id: PlayerId,

    pub created_at: DateTime<Utc>,

    /// Participants, in join order
    #[serde(default)]
    pub player_ids: Vec<PlayerId>,

    #[serde(default)]
    pub player_options: Vec<PlayerOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<PlayerId>,

    #[serde(default)]
    pub state: GameState,

    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl Game {
    /// Create a new ongoing game with no rounds.
    pub fn new(host_id: PlayerId, player_ids: Vec<PlayerId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: GameId::random(),
            host_id,
            created_at,
            player_ids,
            player_options: Vec::new(),
            winner_id: None,
            state: GameState::Ongoing,
            rounds: Vec::new(),
        }
    }

    /// Builder method to set the state.
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self
    }

    /// Builder method to append a round.
    pub fn with_round(mut self, round: Round) -> Self {
        self.rounds.push(round);
        self
    }

    pub fn is_finished(&self) -> bool {
        self.state == GameState::Finished
    }

    /// Finished with at least one round recorded.
    pub fn is_completed(&self) -> bool {
        self.is_finished() && !self.rounds.is_empty()
    }

    pub fn includes(&self, player_id: &PlayerId) -> bool {
        self.player_ids.contains(player_id)
    }

    /// Sum of a player's recorded scores across all rounds.
    pub fn total_for(&self, player_id: &PlayerId) -> f64 {
        self.rounds
            .iter()
            .filter_map(|r| r.score_for(player_id))
            .filter(|s| s.is_finite())
            .sum()
    }
}
