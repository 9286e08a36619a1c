use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::game_summary;
use crate::models::{Game, GameId, GameSummary, PlayerId, Score};

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<Game>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub host_id: PlayerId,
    pub player_ids: Vec<PlayerId>,
}

#[derive(Debug, Deserialize)]
pub struct AddRoundRequest {
    pub scores: Vec<Score>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishGameRequest {
    pub winner_id: Option<PlayerId>,
}

/// Games, newest first.
pub async fn list_games(State(state): State<AppState>) -> Result<Json<GamesResponse>, ApiError> {
    let mut games = state.store.list_games()?;
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(GamesResponse { games }))
}

pub async fn create_game(
    State(state): State<AppState>,
    Json(body): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game = state.store.create_game(body.host_id, body.player_ids)?;
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.store.get_game(&GameId::from(id))?))
}

pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_game(&GameId::from(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `null` until the first round is recorded.
pub async fn game_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<GameSummary>>, ApiError> {
    let game = state.store.get_game(&GameId::from(id))?;
    let players = state.store.list_players()?;
    Ok(Json(game_summary(&game, &players)))
}

pub async fn add_round(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddRoundRequest>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.store.add_round(&GameId::from(id), body.scores)?))
}

pub async fn add_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddPlayerRequest>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(
        state.store.add_player(&GameId::from(id), body.player_id)?,
    ))
}

pub async fn remove_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.store.remove_player(
        &GameId::from(id),
        &PlayerId::from(player_id),
    )?))
}

pub async fn finish_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<FinishGameRequest>>,
) -> Result<Json<Game>, ApiError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(
        state.store.finish_game(&GameId::from(id), body.winner_id)?,
    ))
}
