//! Date-window filtering of games.
//!
//! Windows are whole UTC days, inclusive at both ends. The reference time
//! is passed in so results are reproducible.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Game;

/// Which games to include, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    /// The last seven days plus today
    Week,
    /// The last thirty days plus today
    #[serde(rename = "30days")]
    Last30Days,
    /// Explicit range; without both bounds nothing is filtered
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl DateFilter {
    /// Inclusive `[from, to]` window, or `None` for no filtering.
    pub fn window(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        match *self {
            DateFilter::All => None,
            DateFilter::Today => Some((start_of_day(today), end_of_day(today))),
            DateFilter::Week => Some((start_of_day(today - Duration::days(7)), end_of_day(today))),
            DateFilter::Last30Days => {
                Some((start_of_day(today - Duration::days(30)), end_of_day(today)))
            }
            DateFilter::Custom {
                from: Some(from),
                to: Some(to),
            } => Some((start_of_day(from), end_of_day(to))),
            DateFilter::Custom { .. } => None,
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    /// Parses the preset names; custom ranges are built from their bounds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DateFilter::All),
            "today" => Ok(DateFilter::Today),
            "week" => Ok(DateFilter::Week),
            "30days" => Ok(DateFilter::Last30Days),
            "custom" => Ok(DateFilter::Custom {
                from: None,
                to: None,
            }),
            other => Err(format!("unknown date filter: {}", other)),
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Games created inside the filter's window.
pub fn filter_games_by_date(games: &[Game], filter: DateFilter, now: DateTime<Utc>) -> Vec<Game> {
    match filter.window(now) {
        None => games.to_vec(),
        Some((from, to)) => games
            .iter()
            .filter(|g| g.created_at >= from && g.created_at <= to)
            .cloned()
            .collect(),
    }
}
