//! Career totals for one player.

use crate::models::{Game, PlayerId, PlayerSummary};

/// Summarize a player's history across games in any state.
///
/// Unlike the leaderboard, only rounds with a recorded entry for the player
/// count, and ongoing games are included.
pub fn player_summary(player_id: &PlayerId, games: &[Game]) -> PlayerSummary {
    let mut summary = PlayerSummary::default();

    for game in games {
        if game.includes(player_id) {
            summary.games_played += 1;
        }
        if game.winner_id.as_ref() == Some(player_id) {
            summary.wins += 1;
        }
        for score in game
            .rounds
            .iter()
            .filter_map(|r| r.score_for(player_id))
            .filter(|s| s.is_finite())
        {
            summary.total_score += score;
            summary.rounds_played += 1;
        }
    }

    summary.avg_score_per_game = average(summary.total_score, summary.games_played);
    summary.avg_score_per_round = average(summary.total_score, summary.rounds_played);
    summary
}

fn average(total: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
