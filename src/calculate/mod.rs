//! Statistics calculation engine.
//!
//! Computes derived views from player and game snapshots:
//! - Cross-game leaderboard with shrinkage-adjusted averages
//! - Date-window filtering
//! - Per-player career summaries
//! - Per-game standings and progression

pub mod cache;
pub mod filters;
pub mod game_stats;
pub mod leaderboard;
pub mod player_stats;

pub use cache::LeaderboardCache;
pub use filters::{filter_games_by_date, DateFilter};
pub use game_stats::{game_summary, leading_player};
pub use leaderboard::{compute_leaderboard, sort_stats, LeaderboardOptions, SortKey};
pub use player_stats::player_summary;
