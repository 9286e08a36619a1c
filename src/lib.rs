//! # UNO Tally
//!
//! A local score tracker for UNO with a cross-game leaderboard.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, games, rounds, derived stats)
//! - **calculate**: Leaderboard engine and other derived statistics
//! - **storage**: JSONL snapshots and the game/player store
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
