//! Player and game store.
//!
//! Create/update/delete operations over the JSONL snapshots. Each mutation
//! is a read-modify-write of one file, serialized through a single lock.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use super::{EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::calculate::leading_player;
use crate::models::{Game, GameId, GameState, Player, PlayerId, Round, Score};

pub struct GameStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl GameStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ── Players ──────────────────────────────────────────────────

    pub fn list_players(&self) -> Result<Vec<Player>, StorageError> {
        JsonlReader::for_entity(&self.config, EntityType::Player).read_all()
    }

    pub fn get_player(&self, id: &PlayerId) -> Result<Player, StorageError> {
        self.list_players()?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("player {}", id)))
    }

    /// Create a player, or update the profile of an existing one.
    pub fn upsert_player(&self, player: Player) -> Result<Player, StorageError> {
        if player.id.is_empty() {
            return Err(StorageError::Invalid("player id is required".to_string()));
        }

        let _guard = self.lock();
        let mut players = self.list_players()?;
        match players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => {
                debug!(player = %player.id, "Updating player profile");
                *existing = player.clone();
            }
            None => {
                info!(player = %player.id, name = %player.name, "Registering player");
                players.push(player.clone());
            }
        }
        JsonlWriter::for_entity(&self.config, EntityType::Player).write_all(&players)?;
        Ok(player)
    }

    // ── Games ────────────────────────────────────────────────────

    pub fn list_games(&self) -> Result<Vec<Game>, StorageError> {
        JsonlReader::for_entity(&self.config, EntityType::Game).read_all()
    }

    pub fn get_game(&self, id: &GameId) -> Result<Game, StorageError> {
        self.list_games()?
            .into_iter()
            .find(|g| &g.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Start a new ongoing game.
    pub fn create_game(
        &self,
        host_id: PlayerId,
        player_ids: Vec<PlayerId>,
    ) -> Result<Game, StorageError> {
        if host_id.is_empty() || player_ids.is_empty() {
            return Err(StorageError::Invalid(
                "host id and at least one player are required".to_string(),
            ));
        }

        let _guard = self.lock();
        let game = Game::new(host_id, player_ids, Utc::now());
        JsonlWriter::for_entity(&self.config, EntityType::Game).append(&game)?;
        info!(game = %game.id, players = game.player_ids.len(), "Created game");
        Ok(game)
    }

    /// Replace a stored ongoing game wholesale.
    pub fn update_game(&self, game: Game) -> Result<Game, StorageError> {
        for round in &game.rounds {
            check_scores(&round.scores)?;
        }
        self.modify_ongoing(&game.id.clone(), |stored| {
            *stored = game;
            Ok(())
        })
    }

    pub fn delete_game(&self, id: &GameId) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut games = self.list_games()?;
        let before = games.len();
        games.retain(|g| &g.id != id);
        if games.len() == before {
            return Err(not_found(id));
        }
        self.write_games(&games)?;
        info!(game = %id, "Deleted game");
        Ok(())
    }

    /// Delete every game. Returns how many were removed.
    pub fn clear_games(&self) -> Result<usize, StorageError> {
        let _guard = self.lock();
        let count = self.list_games()?.len();
        self.write_games(&[])?;
        info!(count, "Cleared all games");
        Ok(count)
    }

    /// Record a round of scores. Every score must be a finite number.
    pub fn add_round(&self, id: &GameId, scores: Vec<Score>) -> Result<Game, StorageError> {
        check_scores(&scores)?;
        self.modify_ongoing(id, |game| {
            game.rounds.push(Round::new(scores, Utc::now()));
            debug!(game = %game.id, round = game.rounds.len(), "Recorded round");
            Ok(())
        })
    }

    /// Add a participant mid-game.
    ///
    /// Every round already played is backfilled with the mean of that
    /// round's existing scores.
    pub fn add_player(&self, id: &GameId, player_id: PlayerId) -> Result<Game, StorageError> {
        self.modify_ongoing(id, |game| {
            if game.includes(&player_id) {
                return Ok(());
            }
            for round in &mut game.rounds {
                let backfill = round.mean_score();
                round.scores.push(Score::new(player_id.clone(), backfill));
            }
            info!(game = %game.id, player = %player_id, "Player joined game");
            game.player_ids.push(player_id);
            Ok(())
        })
    }

    /// Remove a participant and every score they recorded.
    pub fn remove_player(&self, id: &GameId, player_id: &PlayerId) -> Result<Game, StorageError> {
        self.modify_ongoing(id, |game| {
            if !game.includes(player_id) {
                return Ok(());
            }
            game.player_ids.retain(|p| p != player_id);
            for round in &mut game.rounds {
                round.scores.retain(|s| &s.player_id != player_id);
            }
            info!(game = %game.id, player = %player_id, "Player left game");
            Ok(())
        })
    }

    /// Mark a game finished. Without an explicit winner the participant with
    /// the lowest total wins.
    pub fn finish_game(
        &self,
        id: &GameId,
        winner: Option<PlayerId>,
    ) -> Result<Game, StorageError> {
        self.modify_ongoing(id, |game| {
            if let Some(winner) = &winner {
                if !game.includes(winner) {
                    return Err(StorageError::Invalid(format!(
                        "winner {} is not in game {}",
                        winner, game.id
                    )));
                }
            }
            game.winner_id = winner.or_else(|| leading_player(game));
            game.state = GameState::Finished;
            info!(game = %game.id, rounds = game.rounds.len(), "Finished game");
            Ok(())
        })
    }

    fn modify_ongoing<F>(&self, id: &GameId, change: F) -> Result<Game, StorageError>
    where
        F: FnOnce(&mut Game) -> Result<(), StorageError>,
    {
        self.modify_game(id, |game| {
            if game.state == GameState::Finished {
                return Err(StorageError::Finished(game.id.clone()));
            }
            change(game)
        })
    }

    fn modify_game<F>(&self, id: &GameId, change: F) -> Result<Game, StorageError>
    where
        F: FnOnce(&mut Game) -> Result<(), StorageError>,
    {
        let _guard = self.lock();
        let mut games = self.list_games()?;
        let game = games
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| not_found(id))?;
        change(game)?;
        let updated = game.clone();
        self.write_games(&games)?;
        Ok(updated)
    }

    fn write_games(&self, games: &[Game]) -> Result<usize, StorageError> {
        JsonlWriter::for_entity(&self.config, EntityType::Game).write_all(games)
    }
}

fn not_found(id: &GameId) -> StorageError {
    StorageError::NotFound(format!("game {}", id))
}

/// Non-finite scores cannot be written as JSON numbers.
fn check_scores(scores: &[Score]) -> Result<(), StorageError> {
    match scores.iter().find(|s| !s.score.is_finite()) {
        Some(bad) => Err(StorageError::Invalid(format!(
            "score for {} must be a finite number",
            bad.player_id
        ))),
        None => Ok(()),
    }
}
