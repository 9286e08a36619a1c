use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{filter_games_by_date, sort_stats, DateFilter, SortKey};
use crate::models::LeaderboardStat;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    /// all | today | week | 30days | custom
    pub date: Option<String>,
    /// Custom range start (YYYY-MM-DD)
    pub from: Option<String>,
    /// Custom range end (YYYY-MM-DD)
    pub to: Option<String>,
    pub sort: Option<String>,
    pub include_zero: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[serde(flatten)]
    pub stat: LeaderboardStat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
    pub sort: SortKey,
    /// Games inside the date window, in any state
    pub games_considered: u32,
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("invalid date: {}", s)))
        })
        .transpose()
}

fn date_filter(params: &LeaderboardParams) -> Result<DateFilter, ApiError> {
    let filter = match params.date.as_deref() {
        None => DateFilter::All,
        Some(s) => s.parse::<DateFilter>().map_err(ApiError::BadRequest)?,
    };
    Ok(match filter {
        DateFilter::Custom { .. } => DateFilter::Custom {
            from: parse_date(params.from.as_deref())?,
            to: parse_date(params.to.as_deref())?,
        },
        other => other,
    })
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let filter = date_filter(&params)?;
    let sort = match params.sort.as_deref() {
        None => SortKey::default(),
        Some(s) => s.parse::<SortKey>().map_err(ApiError::BadRequest)?,
    };

    let mut options = (*state.options).clone();
    if let Some(include_zero) = params.include_zero {
        options.include_zero_round_players = include_zero;
    }

    let players = state.store.list_players()?;
    let games = filter_games_by_date(&state.store.list_games()?, filter, Utc::now());

    let mut rows = state.cache.get_or_compute(&players, &games, &options);
    if sort != SortKey::Rating {
        sort_stats(&mut rows, sort);
    }

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(i, stat)| LeaderboardEntry {
            rank: i as u32 + 1,
            stat,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        entries,
        sort,
        games_considered: games.len() as u32,
    }))
}
