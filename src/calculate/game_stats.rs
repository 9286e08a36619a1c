//! Per-game breakdowns: standings, winner and score progression.

use std::collections::HashMap;

use crate::models::{Game, GameSummary, Player, PlayerBreakdown, PlayerId, ProgressionRow};

/// Participant with the lowest total so far. Ties go to the earlier joiner.
pub fn leading_player(game: &Game) -> Option<PlayerId> {
    game.player_ids
        .iter()
        .map(|id| (id, game.total_for(id)))
        .fold(None, |best: Option<(&PlayerId, f64)>, (id, total)| match best {
            Some((_, lowest)) if lowest <= total => best,
            _ => Some((id, total)),
        })
        .map(|(id, _)| id.clone())
}

/// Summarize a game for display. `None` if no rounds have been played.
///
/// Participants without a player profile are left out of the standings.
pub fn game_summary(game: &Game, players: &[Player]) -> Option<GameSummary> {
    if game.rounds.is_empty() {
        return None;
    }

    let lookup: HashMap<&PlayerId, &Player> = players.iter().map(|p| (&p.id, p)).collect();
    let participants: Vec<&Player> = game
        .player_ids
        .iter()
        .filter_map(|id| lookup.get(id).copied())
        .collect();
    let round_count = game.rounds.len() as f64;

    let mut standings: Vec<PlayerBreakdown> = participants
        .iter()
        .map(|player| {
            let scores: Vec<f64> = game
                .rounds
                .iter()
                .filter_map(|r| r.score_for(&player.id))
                .filter(|s| s.is_finite())
                .collect();
            let total: f64 = scores.iter().sum();
            PlayerBreakdown {
                player: (*player).clone(),
                total,
                avg: total / round_count,
                best: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
                worst: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
            }
        })
        .collect();
    // Stable, so equal totals keep join order and agree with `leading_player`.
    standings.sort_by(|a, b| a.total.total_cmp(&b.total));

    let winner = game
        .winner_id
        .as_ref()
        .and_then(|id| lookup.get(id))
        .map(|p| (*p).clone())
        .or_else(|| standings.first().map(|s| s.player.clone()));

    let total_points = standings.iter().map(|s| s.total).sum();
    let average_per_player = if standings.is_empty() {
        0.0
    } else {
        standings.iter().map(|s| s.avg).sum::<f64>() / standings.len() as f64
    };

    Some(GameSummary {
        winner,
        rounds: game.rounds.len() as u32,
        total_points,
        average_per_player,
        standings,
        progression: progression(game, &participants),
    })
}

fn progression(game: &Game, participants: &[&Player]) -> Vec<ProgressionRow> {
    let mut running: HashMap<&PlayerId, f64> = HashMap::new();

    game.rounds
        .iter()
        .enumerate()
        .map(|(i, round)| {
            for player in participants {
                if let Some(score) = round.score_for(&player.id).filter(|s| s.is_finite()) {
                    *running.entry(&player.id).or_insert(0.0) += score;
                }
            }
            ProgressionRow {
                round: format!("R{}", i + 1),
                totals: participants
                    .iter()
                    .filter_map(|p| running.get(&p.id).map(|t| (p.name.clone(), *t)))
                    .collect(),
            }
        })
        .collect()
}
