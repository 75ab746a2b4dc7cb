pub mod client;
pub mod mappings;
pub mod schedule;
pub mod statistics;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub use client::{ApiError, ApiResult, Endpoints, FantasyApi, DEFAULT_SEASON};

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of upstream wire formats
// ---------------------------------------------------------------------------

/// One driver's accumulated season performance.
///
/// `price` and `season_score` are kept as strings: price carries fractional
/// cost data ("25.5") that must survive untouched for currency-style display,
/// and scores are integral totals rendered once at aggregation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Driver {
    pub id: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Fantasy cost as of the numerically-last round this driver appeared in.
    pub price: String,
    /// Running total of points across all processed rounds.
    pub season_score: String,
    /// Round key → points scored in that round only. Key order is not
    /// meaningful; use [`Driver::race_scores_sorted`] for display.
    pub scores_by_race: BTreeMap<String, String>,
}

impl Driver {
    /// Per-round scores sorted by numeric round value (input round keys are
    /// strings, so "10" would otherwise sort before "2").
    pub fn race_scores_sorted(&self) -> Vec<(u32, &str)> {
        sorted_scores(&self.scores_by_race)
    }
}

/// One constructor's accumulated season performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constructor {
    pub id: String,
    pub display_name: String,
    pub price: String,
    pub season_score: String,
    pub scores_by_race: BTreeMap<String, String>,
}

impl Constructor {
    pub fn race_scores_sorted(&self) -> Vec<(u32, &str)> {
        sorted_scores(&self.scores_by_race)
    }
}

fn sorted_scores(scores: &BTreeMap<String, String>) -> Vec<(u32, &str)> {
    let mut out: Vec<(u32, &str)> = scores
        .iter()
        .filter_map(|(round, pts)| round.parse().ok().map(|r| (r, pts.as_str())))
        .collect();
    out.sort_unstable_by_key(|(round, _)| *round);
    out
}

/// Fully aggregated season result. Immutable once produced: a fresh load
/// cycle supersedes the whole snapshot, it is never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonSnapshot {
    pub last_updated: DateTime<Utc>,
    pub season: u16,
    pub drivers: Vec<Driver>,
    pub constructors: Vec<Constructor>,
}

impl SeasonSnapshot {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.constructors.is_empty()
    }
}

/// Result of one statistics load cycle. `is_stale` is true whenever the data
/// did not come from the live endpoint; `data` is `None` only when both the
/// live and fallback tiers were unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadResult {
    pub data: Option<SeasonSnapshot>,
    pub is_stale: bool,
}

/// One calendar entry, with the `name`/`race_name` upstream drift already
/// collapsed to the single canonical `name` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Race {
    pub round: u32,
    pub name: String,
    /// ISO date, "YYYY-MM-DD".
    pub date: String,
}

/// Schedule partitioned around today: the most recent past race and the next
/// upcoming one. Either side may be absent at the season boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RaceInfo {
    pub current_race: Option<Race>,
    pub upcoming_race: Option<Race>,
}
