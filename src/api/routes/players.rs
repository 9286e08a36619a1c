use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::player_summary;
use crate::models::{Player, PlayerId, PlayerSummary};

#[derive(Debug, Serialize)]
pub struct PlayersResponse {
    pub players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertPlayerRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct PlayerStatsResponse {
    pub player: Player,
    pub stats: PlayerSummary,
}

pub async fn list_players(
    State(state): State<AppState>,
) -> Result<Json<PlayersResponse>, ApiError> {
    let mut players = state.store.list_players()?;
    players.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(PlayersResponse { players }))
}

pub async fn upsert_player(
    State(state): State<AppState>,
    Json(body): Json<UpsertPlayerRequest>,
) -> Result<Json<Player>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("player name is required".to_string()));
    }
    let player = Player::new(body.id, body.name).with_avatar(body.avatar);
    Ok(Json(state.store.upsert_player(player)?))
}

pub async fn player_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerStatsResponse>, ApiError> {
    let id = PlayerId::from(id);
    let player = state.store.get_player(&id)?;
    let games = state.store.list_games()?;

    Ok(Json(PlayerStatsResponse {
        stats: player_summary(&id, &games),
        player,
    }))
}
