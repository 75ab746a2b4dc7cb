//! Wire types for the statistics endpoint's schema versions.
//!
//! The upstream has shipped at least two shapes for the same endpoint: a
//! detailed nested `seasonResult.raceResults` structure, and an older flat
//! round → entity table. A decoded payload is classified once by
//! [`detect_shape`] and dispatched on the tag; aggregation code never probes
//! fields ad hoc.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Closed set of known statistics payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `seasonResult.raceResults` keyed by round.
    Detailed,
    /// Flat round → per-abbreviation score table, no `seasonResult` wrapper.
    Simple,
    /// Neither shape matched. Aggregates to an empty (not null) snapshot.
    Unrecognized,
}

/// Classify a decoded statistics payload.
///
/// A `seasonResult` without `raceResults` is not treated as Simple: the
/// wrapper marks the payload as a detailed-family document that is missing
/// its data, which is a quality problem, not an older schema.
pub fn detect_shape(value: &Value) -> Shape {
    match value.get("seasonResult") {
        Some(season) => {
            if season.get("raceResults").map(Value::is_object).unwrap_or(false) {
                Shape::Detailed
            } else {
                Shape::Unrecognized
            }
        }
        None if value.is_object() => Shape::Simple,
        None => Shape::Unrecognized,
    }
}

// ---------------------------------------------------------------------------
// Detailed shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResponse {
    pub season_result: Option<SeasonResult>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeasonResult {
    #[serde(default)]
    pub season: u16,
    #[serde(default)]
    pub race_results: HashMap<String, RaceRound>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RaceRound {
    pub drivers: Option<Vec<DriverResult>>,
    pub constructors: Option<Vec<ConstructorResult>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverResult {
    pub id: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub total_points: f64,
    /// Inactive entries carry no points or price for the round.
    #[serde(default)]
    pub is_active: bool,
    pub constructor_id: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorResult {
    pub id: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub total_points: f64,
}

// ---------------------------------------------------------------------------
// Simple shape
// ---------------------------------------------------------------------------

/// Round key → round data. This shape only ever carried driver scores.
pub type SimpleResponse = HashMap<String, SimpleRound>;

#[derive(Debug, Deserialize, Default)]
pub struct SimpleRound {
    pub drivers: Option<HashMap<String, SimpleEntry>>,
    /// Present in some payloads but never populated with usable data;
    /// kept so it is not misread as a legacy driver entry below.
    pub constructors: Option<HashMap<String, SimpleEntry>>,
    /// The oldest payloads put driver abbreviations directly at round level.
    #[serde(flatten)]
    pub legacy: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SimpleEntry {
    #[serde(default)]
    pub fantasy_cost: f64,
    #[serde(default)]
    pub fantasy_score: f64,
}

impl SimpleRound {
    /// Per-abbreviation driver entries for this round, preferring the
    /// `drivers` sub-table and falling back to legacy round-level entries.
    pub fn driver_entries(&self) -> Vec<(String, SimpleEntry)> {
        if let Some(drivers) = &self.drivers {
            let mut out: Vec<(String, SimpleEntry)> = drivers
                .iter()
                .map(|(abbr, entry)| (abbr.clone(), entry.clone()))
                .collect();
            out.sort_by(|a, b| a.0.cmp(&b.0));
            return out;
        }

        let mut out: Vec<(String, SimpleEntry)> = self
            .legacy
            .iter()
            .filter(|(_, v)| looks_like_entry(v))
            .filter_map(|(abbr, v)| {
                serde_json::from_value(v.clone())
                    .ok()
                    .map(|entry| (abbr.clone(), entry))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Legacy rounds mix entity entries with metadata fields; only objects that
/// carry fantasy scoring keys count as entries.
fn looks_like_entry(value: &Value) -> bool {
    value.get("fantasy_score").is_some() || value.get("fantasy_cost").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_detailed_shape() {
        let value = json!({"seasonResult": {"season": 2025, "raceResults": {}}});
        assert_eq!(detect_shape(&value), Shape::Detailed);
    }

    #[test]
    fn detects_simple_shape_without_season_result() {
        let value = json!({"1": {"VER": {"fantasy_score": 30}}});
        assert_eq!(detect_shape(&value), Shape::Simple);
    }

    #[test]
    fn season_result_without_race_results_is_unrecognized() {
        let value = json!({"seasonResult": {"season": 2025}});
        assert_eq!(detect_shape(&value), Shape::Unrecognized);
    }

    #[test]
    fn non_object_payloads_are_unrecognized() {
        assert_eq!(detect_shape(&json!([1, 2, 3])), Shape::Unrecognized);
        assert_eq!(detect_shape(&json!("nope")), Shape::Unrecognized);
        assert_eq!(detect_shape(&json!(null)), Shape::Unrecognized);
    }

    #[test]
    fn simple_round_prefers_drivers_sub_table() {
        let round: SimpleRound = serde_json::from_value(json!({
            "drivers": {"VER": {"fantasy_cost": 30.5, "fantasy_score": 25}},
            "VER": {"fantasy_cost": 1.0, "fantasy_score": 1}
        }))
        .unwrap();

        let entries = round.driver_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "VER");
        assert_eq!(entries[0].1.fantasy_cost, 30.5);
    }

    #[test]
    fn legacy_round_level_entries_are_read() {
        let round: SimpleRound = serde_json::from_value(json!({
            "VER": {"fantasy_cost": 30.5, "fantasy_score": 25, "fp1_position": 1},
            "NOR": {"fantasy_score": 18},
            "track_name": "Bahrain"
        }))
        .unwrap();

        let entries = round.driver_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "NOR");
        assert_eq!(entries[0].1.fantasy_score, 18.0);
        assert_eq!(entries[1].0, "VER");
    }

    #[test]
    fn absent_numeric_fields_default_to_zero() {
        let entry: SimpleEntry = serde_json::from_value(json!({})).unwrap();
        assert_eq!(entry.fantasy_cost, 0.0);
        assert_eq!(entry.fantasy_score, 0.0);
    }
}
