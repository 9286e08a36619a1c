//! Cross-game leaderboard.
//!
//! Players are ranked by their mean penalty points per round, shrunk toward
//! the global per-round mean so that a player with two lucky rounds does not
//! outrank a player with two hundred solid ones:
//!
//! ```text
//! adj = (total + mu * K) / (rounds + K)
//! ```
//!
//! Only finished games with at least one round are counted. Missing or
//! non-finite scores count as a zero round for the participant.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Game, LeaderboardStat, Player, PlayerId};

/// Floor applied to the adjusted average before inverting it into a rating.
pub const RATING_EPSILON: f64 = 1e-9;

/// Tuning knobs for the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardOptions {
    /// Shrinkage strength K, in pseudo-rounds at the global mean
    #[serde(default = "default_shrinkage_rounds")]
    pub shrinkage_rounds: f64,

    #[serde(default = "default_min_games")]
    pub min_games_for_non_provisional: u32,

    #[serde(default = "default_min_rounds")]
    pub min_rounds_for_non_provisional: u32,

    /// List players that have no counted rounds at all
    #[serde(default)]
    pub include_zero_round_players: bool,
}

fn default_shrinkage_rounds() -> f64 {
    12.0
}

fn default_min_games() -> u32 {
    3
}

fn default_min_rounds() -> u32 {
    24
}

impl Default for LeaderboardOptions {
    fn default() -> Self {
        Self {
            shrinkage_rounds: default_shrinkage_rounds(),
            min_games_for_non_provisional: default_min_games(),
            min_rounds_for_non_provisional: default_min_rounds(),
            include_zero_round_players: false,
        }
    }
}

impl LeaderboardOptions {
    /// Builder method to toggle zero-round players.
    pub fn with_zero_round_players(mut self, include: bool) -> Self {
        self.include_zero_round_players = include;
        self
    }
}

#[derive(Debug, Default)]
struct Tally {
    games_played: u32,
    rounds_played: u32,
    total: f64,
}

/// Rank players across all completed games.
///
/// Returns an empty list when there is nothing informative to rank: no
/// completed rounds anywhere, or every listed player totals zero.
pub fn compute_leaderboard(
    players: &[Player],
    games: &[Game],
    options: &LeaderboardOptions,
) -> Vec<LeaderboardStat> {
    // First occurrence wins if a player id is listed twice.
    let mut tallies: HashMap<&PlayerId, Tally> = HashMap::with_capacity(players.len());
    let mut roster: Vec<&Player> = Vec::with_capacity(players.len());
    for player in players {
        if !tallies.contains_key(&player.id) {
            tallies.insert(&player.id, Tally::default());
            roster.push(player);
        }
    }

    let mut pool_sum = 0.0;
    let mut pool_len = 0u64;
    let mut completed = 0usize;

    for game in games.iter().filter(|g| g.is_completed()) {
        completed += 1;

        let mut seen = HashSet::with_capacity(game.player_ids.len());
        let participants: Vec<&PlayerId> = game
            .player_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .collect();

        for id in &participants {
            if let Some(tally) = tallies.get_mut(id) {
                tally.games_played += 1;
            }
        }

        for round in &game.rounds {
            for id in &participants {
                let Some(tally) = tallies.get_mut(id) else {
                    continue;
                };
                let value = round
                    .score_for(id)
                    .filter(|s| s.is_finite())
                    .unwrap_or(0.0);
                tally.total += value;
                tally.rounds_played += 1;
                pool_sum += value;
                pool_len += 1;
            }
        }
    }

    if pool_len == 0 {
        debug!(
            games = games.len(),
            completed, "No completed rounds; leaderboard is empty"
        );
        return Vec::new();
    }

    let mu = pool_sum / pool_len as f64;
    let k = options.shrinkage_rounds;

    let rows: Vec<LeaderboardStat> = roster
        .into_iter()
        .filter_map(|player| {
            let tally = tallies.get(&player.id)?;
            if tally.rounds_played == 0 && !options.include_zero_round_players {
                return None;
            }
            Some(build_row(player, tally, mu, k, options))
        })
        .collect();

    if rows.iter().all(|r| r.total_score == 0.0) {
        debug!(
            players = rows.len(),
            "Every player totals zero; leaderboard is empty"
        );
        return Vec::new();
    }

    let ranked = rank(rows);
    debug!(
        rows = ranked.len(),
        completed,
        observations = pool_len,
        mu,
        "Computed leaderboard"
    );
    ranked
}

fn build_row(
    player: &Player,
    tally: &Tally,
    mu: f64,
    k: f64,
    options: &LeaderboardOptions,
) -> LeaderboardStat {
    let rounds = tally.rounds_played as f64;
    let (avg_per_round, adj_avg_per_round) = if tally.rounds_played > 0 {
        (tally.total / rounds, (tally.total + mu * k) / (rounds + k))
    } else {
        (0.0, mu)
    };

    LeaderboardStat {
        player: player.clone(),
        games_played: tally.games_played,
        rounds_played: tally.rounds_played,
        total_score: tally.total,
        avg_per_round,
        adj_avg_per_round,
        rating: 1.0 / adj_avg_per_round.max(RATING_EPSILON),
        provisional: tally.games_played < options.min_games_for_non_provisional
            || tally.rounds_played < options.min_rounds_for_non_provisional,
    }
}

/// Sort by adjusted average, then move provisional rows after the rest
/// without disturbing either group's order.
fn rank(mut rows: Vec<LeaderboardStat>) -> Vec<LeaderboardStat> {
    rows.sort_by(compare_rows);
    let (mut ranked, provisional): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|r| !r.provisional);
    ranked.extend(provisional);
    ranked
}

fn compare_rows(a: &LeaderboardStat, b: &LeaderboardStat) -> Ordering {
    a.adj_avg_per_round
        .total_cmp(&b.adj_avg_per_round)
        .then_with(|| b.rounds_played.cmp(&a.rounds_played))
        .then_with(|| b.games_played.cmp(&a.games_played))
        .then_with(|| a.player.name.cmp(&b.player.name))
        .then_with(|| a.player.id.cmp(&b.player.id))
}

/// Display orderings offered on top of the engine's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Engine order: adjusted average ascending
    #[default]
    Rating,
    /// Most games first
    Games,
    /// Raw average ascending
    Avg,
    /// Total points ascending
    Total,
    Name,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rating" => Ok(SortKey::Rating),
            "games" => Ok(SortKey::Games),
            "avg" => Ok(SortKey::Avg),
            "total" => Ok(SortKey::Total),
            "name" => Ok(SortKey::Name),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Rating => write!(f, "rating"),
            SortKey::Games => write!(f, "games"),
            SortKey::Avg => write!(f, "avg"),
            SortKey::Total => write!(f, "total"),
            SortKey::Name => write!(f, "name"),
        }
    }
}

/// Stable re-sort of leaderboard rows for display.
pub fn sort_stats(rows: &mut [LeaderboardStat], key: SortKey) {
    match key {
        SortKey::Rating => rows.sort_by(|a, b| a.adj_avg_per_round.total_cmp(&b.adj_avg_per_round)),
        SortKey::Games => rows.sort_by(|a, b| b.games_played.cmp(&a.games_played)),
        SortKey::Avg => rows.sort_by(|a, b| a.avg_per_round.total_cmp(&b.avg_per_round)),
        SortKey::Total => rows.sort_by(|a, b| a.total_score.total_cmp(&b.total_score)),
        SortKey::Name => rows.sort_by(|a, b| a.player.name.cmp(&b.player.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameState, Round, Score};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn player(id: &str, name: &str) -> Player {
        Player::new(id, name)
    }

    fn round(scores: &[(&str, f64)]) -> Round {
        Round::new(
            scores.iter().map(|(id, s)| Score::new(*id, *s)).collect(),
            Utc.with_ymd_and_hms(2025, 5, 1, 20, 0, 0).unwrap(),
        )
    }

    fn game(state: GameState, ids: &[&str], rounds: Vec<Round>) -> Game {
        let mut game = Game::new(
            ids[0].into(),
            ids.iter().map(|id| PlayerId::from(*id)).collect(),
            Utc.with_ymd_and_hms(2025, 5, 1, 19, 0, 0).unwrap(),
        )
        .with_state(state);
        game.rounds = rounds;
        game
    }

    fn finished(ids: &[&str], rounds: Vec<Round>) -> Game {
        game(GameState::Finished, ids, rounds)
    }

    fn names(rows: &[LeaderboardStat]) -> Vec<&str> {
        rows.iter().map(|r| r.player.name.as_str()).collect()
    }

    fn defaults() -> LeaderboardOptions {
        LeaderboardOptions::default()
    }

    #[test]
    fn test_default_options() {
        let options = LeaderboardOptions::default();
        assert_eq!(options.shrinkage_rounds, 12.0);
        assert_eq!(options.min_games_for_non_provisional, 3);
        assert_eq!(options.min_rounds_for_non_provisional, 24);
        assert!(!options.include_zero_round_players);
    }

    #[test]
    fn test_options_partial_toml_falls_back_to_defaults() {
        let options: LeaderboardOptions = toml::from_str("shrinkage_rounds = 4.0").unwrap();
        assert_eq!(options.shrinkage_rounds, 4.0);
        assert_eq!(options.min_games_for_non_provisional, 3);
        assert_eq!(options.min_rounds_for_non_provisional, 24);
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_leaderboard(&[], &[], &defaults()).is_empty());
    }

    #[test]
    fn test_single_round_lower_score_ranks_first() {
        let players = vec![player("p2", "Bob"), player("p1", "Alice")];
        let games = vec![finished(&["p1", "p2"], vec![round(&[("p1", 0.0), ("p2", 5.0)])])];

        let rows = compute_leaderboard(&players, &games, &defaults());

        assert_eq!(names(&rows), vec!["Alice", "Bob"]);
        assert!(rows.iter().all(|r| r.provisional));
        // mu = 2.5, K = 12
        assert!((rows[0].adj_avg_per_round - 30.0 / 13.0).abs() < 1e-12);
        assert!((rows[1].adj_avg_per_round - 35.0 / 13.0).abs() < 1e-12);
        assert_eq!(rows[1].avg_per_round, 5.0);
    }

    #[test]
    fn test_ongoing_games_are_ignored() {
        let players = vec![player("p1", "Alice"), player("p2", "Bob")];
        let games = vec![game(
            GameState::Ongoing,
            &["p1", "p2"],
            vec![round(&[("p1", 0.0), ("p2", 5.0)])],
        )];

        assert!(compute_leaderboard(&players, &games, &defaults()).is_empty());
    }

    #[test]
    fn test_finished_games_without_rounds_are_ignored() {
        let players = vec![player("p1", "Alice"), player("p2", "Bob")];
        let games = vec![
            finished(&["p1", "p2"], vec![]),
            game(GameState::Ongoing, &["p1", "p2"], vec![]),
        ];

        assert!(compute_leaderboard(&players, &games, &defaults()).is_empty());
    }

    #[test]
    fn test_all_zero_scores_yield_empty() {
        let players = vec![player("p1", "Alice"), player("p2", "Bob")];
        let games = vec![finished(
            &["p1", "p2"],
            vec![round(&[("p1", 0.0), ("p2", 0.0)]), round(&[("p1", 0.0)])],
        )];

        assert!(compute_leaderboard(&players, &games, &defaults()).is_empty());
    }

    #[test]
    fn test_missing_score_counts_as_zero_round() {
        let players = vec![
            player("p1", "Alice"),
            player("p2", "Bob"),
            player("p3", "Cara"),
        ];
        let games = vec![finished(
            &["p1", "p2", "p3"],
            vec![round(&[("p1", 10.0), ("p2", 20.0)])],
        )];

        let rows = compute_leaderboard(&players, &games, &defaults());
        let cara = rows.iter().find(|r| r.player.name == "Cara").unwrap();

        assert_eq!(cara.rounds_played, 1);
        assert_eq!(cara.games_played, 1);
        assert_eq!(cara.total_score, 0.0);
        assert_eq!(names(&rows), vec!["Cara", "Alice", "Bob"]);
    }

    #[test]
    fn test_non_finite_scores_count_as_zero() {
        let players = vec![player("p1", "Alice"), player("p2", "Bob")];
        let games = vec![finished(
            &["p1", "p2"],
            vec![
                round(&[("p1", f64::NAN), ("p2", 8.0)]),
                round(&[("p1", f64::INFINITY), ("p2", 8.0)]),
            ],
        )];

        let rows = compute_leaderboard(&players, &games, &defaults());
        let alice = rows.iter().find(|r| r.player.name == "Alice").unwrap();

        assert_eq!(alice.total_score, 0.0);
        assert_eq!(alice.rounds_played, 2);
        assert!(rows.iter().all(|r| r.adj_avg_per_round.is_finite()));
    }

    #[test]
    fn test_scores_for_non_participants_are_ignored() {
        let players = vec![player("p1", "Alice"), player("p2", "Bob")];
        let with_ghost = vec![finished(
            &["p1", "p2"],
            vec![round(&[("p1", 2.0), ("p2", 6.0), ("ghost", 500.0)])],
        )];
        let without_ghost = vec![finished(
            &["p1", "p2"],
            vec![round(&[("p1", 2.0), ("p2", 6.0)])],
        )];

        assert_eq!(
            compute_leaderboard(&players, &with_ghost, &defaults()),
            compute_leaderboard(&players, &without_ghost, &defaults())
        );
    }

    #[test]
    fn test_full_tie_breaks_on_name() {
        let players = vec![
            player("b", "Bob"),
            player("a", "Alice"),
            player("c", "Cara"),
        ];
        let games = vec![finished(
            &["b", "a", "c"],
            vec![
                round(&[("a", 5.0), ("b", 5.0), ("c", 0.0)]),
                round(&[("a", 7.0), ("b", 7.0), ("c", 1.0)]),
            ],
        )];

        let rows = compute_leaderboard(&players, &games, &defaults());

        assert_eq!(names(&rows), vec!["Cara", "Alice", "Bob"]);
        assert_eq!(rows[1].adj_avg_per_round, rows[2].adj_avg_per_round);
    }

    #[test]
    fn test_tie_prefers_more_rounds() {
        // Both average exactly mu, so both adjust to mu.
        let players = vec![player("a", "Alice"), player("b", "Bob")];
        let games = vec![
            finished(&["a", "b"], vec![round(&[("a", 5.0), ("b", 5.0)])]),
            finished(&["b"], vec![round(&[("b", 5.0)])]),
        ];

        let rows = compute_leaderboard(&players, &games, &defaults());

        assert_eq!(names(&rows), vec!["Bob", "Alice"]);
        assert_eq!(rows[0].rounds_played, 2);
    }

    #[test]
    fn test_provisional_rows_follow_established_rows() {
        let players = vec![
            player("a", "Alice"),
            player("b", "Bob"),
            player("c", "Cara"),
        ];
        let mut games: Vec<Game> = (0..3)
            .map(|_| {
                finished(
                    &["a", "c"],
                    (0..8).map(|_| round(&[("a", 20.0), ("c", 10.0)])).collect(),
                )
            })
            .collect();
        games.push(finished(&["b", "c"], vec![round(&[("b", 0.0), ("c", 10.0)])]));

        let rows = compute_leaderboard(&players, &games, &defaults());

        // By adjusted average alone Bob sits between Cara and Alice.
        let bob = rows.iter().find(|r| r.player.name == "Bob").unwrap();
        let alice = rows.iter().find(|r| r.player.name == "Alice").unwrap();
        assert!(bob.adj_avg_per_round < alice.adj_avg_per_round);

        assert_eq!(names(&rows), vec!["Cara", "Alice", "Bob"]);
        assert!(!rows[0].provisional);
        assert!(!rows[1].provisional);
        assert!(rows[2].provisional);
        assert_eq!(rows[0].games_played, 4);
        assert_eq!(rows[0].rounds_played, 25);
    }

    #[test]
    fn test_shrinkage_pulls_toward_global_mean() {
        let players = vec![player("a", "Alice"), player("b", "Bob")];
        let mut games: Vec<Game> = (0..4)
            .map(|_| {
                finished(
                    &["a"],
                    (0..10).map(|_| round(&[("a", 4.0)])).collect(),
                )
            })
            .collect();
        games.push(finished(
            &["b"],
            vec![round(&[("b", 30.0)]), round(&[("b", 20.0)])],
        ));

        let rows = compute_leaderboard(&players, &games, &defaults());
        let bob = rows.iter().find(|r| r.player.name == "Bob").unwrap();
        let mu = (40.0 * 4.0 + 50.0) / 42.0;

        assert_eq!(bob.avg_per_round, 25.0);
        assert!(bob.adj_avg_per_round < bob.avg_per_round);
        assert!(bob.adj_avg_per_round > mu);
    }

    #[test]
    fn test_shrinkage_vanishes_with_sample_size() {
        let players = vec![player("s", "Steady"), player("x", "Other")];
        let gap = |n: usize| {
            let games = vec![finished(
                &["s", "x"],
                (0..n).map(|_| round(&[("s", 5.0), ("x", 15.0)])).collect(),
            )];
            let rows = compute_leaderboard(&players, &games, &defaults());
            let steady = rows.iter().find(|r| r.player.name == "Steady").unwrap();
            (steady.adj_avg_per_round - 5.0).abs()
        };

        let (small, medium, large) = (gap(12), gap(120), gap(1200));
        assert!((small - 2.5).abs() < 1e-9);
        assert!(medium < small);
        assert!(large < medium);
        assert!(large < 0.06);
    }

    #[test]
    fn test_zero_shrinkage_uses_raw_average() {
        let options = LeaderboardOptions {
            shrinkage_rounds: 0.0,
            ..LeaderboardOptions::default()
        };
        let players = vec![player("a", "Alice"), player("b", "Bob")];
        let games = vec![finished(&["a", "b"], vec![round(&[("a", 3.0), ("b", 9.0)])])];

        let rows = compute_leaderboard(&players, &games, &options);
        assert!(rows.iter().all(|r| r.adj_avg_per_round == r.avg_per_round));
    }

    #[test]
    fn test_zero_round_players_excluded_by_default() {
        let players = vec![
            player("a", "Alice"),
            player("b", "Bob"),
            player("z", "Zed"),
        ];
        let games = vec![finished(&["a", "b"], vec![round(&[("a", 1.0), ("b", 3.0)])])];

        let rows = compute_leaderboard(&players, &games, &defaults());
        assert_eq!(names(&rows), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_zero_round_players_sit_at_global_mean() {
        let players = vec![
            player("a", "Alice"),
            player("b", "Bob"),
            player("z", "Zed"),
        ];
        let games = vec![finished(&["a", "b"], vec![round(&[("a", 1.0), ("b", 3.0)])])];
        let options = defaults().with_zero_round_players(true);

        let rows = compute_leaderboard(&players, &games, &options);
        let zed = rows.iter().find(|r| r.player.name == "Zed").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(zed.rounds_played, 0);
        assert_eq!(zed.avg_per_round, 0.0);
        assert_eq!(zed.adj_avg_per_round, 2.0);
        assert_eq!(zed.rating, 0.5);
        assert!(zed.provisional);
        assert_eq!(names(&rows), vec!["Alice", "Zed", "Bob"]);
    }

    #[test]
    fn test_rating_is_inverse_of_adjusted_average() {
        let players = vec![
            player("a", "Alice"),
            player("b", "Bob"),
            player("c", "Cara"),
        ];
        let games = vec![
            finished(&["a", "b", "c"], vec![round(&[("a", 0.0), ("b", 12.0), ("c", 30.0)])]),
            finished(&["a", "c"], vec![round(&[("a", 8.0), ("c", 2.0)])]),
        ];

        let rows = compute_leaderboard(&players, &games, &defaults());

        for a in &rows {
            assert!((a.rating - 1.0 / a.adj_avg_per_round).abs() < 1e-12);
            for b in &rows {
                if a.adj_avg_per_round < b.adj_avg_per_round {
                    assert!(a.rating > b.rating);
                }
            }
        }
    }

    #[test]
    fn test_rating_floor_avoids_division_by_zero() {
        let options = LeaderboardOptions {
            shrinkage_rounds: 0.0,
            ..LeaderboardOptions::default()
        };
        let players = vec![player("a", "Alice"), player("b", "Bob")];
        let games = vec![finished(&["a", "b"], vec![round(&[("a", 0.0), ("b", 4.0)])])];

        let rows = compute_leaderboard(&players, &games, &options);
        assert_eq!(rows[0].player.name, "Alice");
        assert_eq!(rows[0].rating, 1.0 / RATING_EPSILON);
    }

    #[test]
    fn test_duplicate_participant_counts_once() {
        let players = vec![player("a", "Alice"), player("b", "Bob")];
        let games = vec![finished(
            &["a", "a", "b"],
            vec![round(&[("a", 2.0), ("b", 4.0)])],
        )];

        let rows = compute_leaderboard(&players, &games, &defaults());
        let alice = rows.iter().find(|r| r.player.name == "Alice").unwrap();
        assert_eq!(alice.games_played, 1);
        assert_eq!(alice.rounds_played, 1);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let players = vec![
            player("x1", "Sam"),
            player("x2", "Sam"),
            player("a", "Alice"),
        ];
        let games = vec![finished(
            &["x1", "x2", "a"],
            vec![round(&[("x1", 4.0), ("x2", 4.0), ("a", 9.0)])],
        )];

        let first = compute_leaderboard(&players, &games, &defaults());
        let second = compute_leaderboard(&players, &games, &defaults());

        assert_eq!(first, second);
        assert_eq!(first[0].player.id.as_str(), "x1");
        assert_eq!(first[1].player.id.as_str(), "x2");
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let players = vec![player("b", "Bob"), player("a", "Alice")];
        let games = vec![finished(&["a", "b"], vec![round(&[("a", 1.0), ("b", 2.0)])])];
        let (players_before, games_before) = (players.clone(), games.clone());

        let _ = compute_leaderboard(&players, &games, &defaults());

        assert_eq!(players, players_before);
        assert_eq!(games, games_before);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("rating".parse::<SortKey>().unwrap(), SortKey::Rating);
        assert_eq!("Total".parse::<SortKey>().unwrap(), SortKey::Total);
        assert!("elo".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Avg.to_string(), "avg");
    }

    #[test]
    fn test_sort_stats_by_total_and_name() {
        let players = vec![
            player("a", "Alice"),
            player("b", "Bob"),
            player("c", "Cara"),
        ];
        let games = vec![finished(
            &["a", "b", "c"],
            vec![
                round(&[("a", 10.0), ("b", 1.0), ("c", 4.0)]),
                round(&[("a", 0.0), ("b", 1.0), ("c", 4.0)]),
            ],
        )];
        let mut rows = compute_leaderboard(&players, &games, &defaults());

        sort_stats(&mut rows, SortKey::Total);
        assert_eq!(names(&rows), vec!["Bob", "Cara", "Alice"]);

        sort_stats(&mut rows, SortKey::Name);
        assert_eq!(names(&rows), vec!["Alice", "Bob", "Cara"]);

        sort_stats(&mut rows, SortKey::Rating);
        assert_eq!(names(&rows), vec!["Bob", "Cara", "Alice"]);
    }
}
