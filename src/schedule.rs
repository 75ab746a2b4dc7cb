//! Wire types and normalization for the race schedule endpoint.
//!
//! The upstream has renamed the race title field (`name` vs `race_name`);
//! both spellings are collapsed to the canonical `name` immediately after
//! decode so neither survives past the ingestion boundary.

use crate::{Race, RaceInfo};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub races: Vec<RaceEntry>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RaceEntry {
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub date: String,
    pub name: Option<String>,
    pub race_name: Option<String>,
}

impl RaceEntry {
    pub fn normalize(self) -> Race {
        let name = self.name.or(self.race_name).unwrap_or_default();
        Race {
            round: self.round,
            name,
            date: self.date,
        }
    }
}

/// Partition a schedule around `today` at day granularity: the most recent
/// race dated strictly before today becomes `current_race`, the earliest one
/// dated today or later becomes `upcoming_race`. Entries with unparsable
/// dates are dropped.
pub fn partition(races: Vec<Race>, today: NaiveDate) -> RaceInfo {
    let mut dated: Vec<(NaiveDate, Race)> = races
        .into_iter()
        .filter_map(|race| parse_race_date(&race.date).map(|date| (date, race)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut info = RaceInfo::default();
    for (date, race) in dated {
        if date < today {
            info.current_race = Some(race);
        } else if info.upcoming_race.is_none() {
            info.upcoming_race = Some(race);
        }
    }
    info
}

/// Accepts "YYYY-MM-DD" and timestamped variants ("YYYY-MM-DDT..").
fn parse_race_date(date: &str) -> Option<NaiveDate> {
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn race(round: u32, date: &str) -> Race {
        Race {
            round,
            name: format!("Round {round}"),
            date: date.into(),
        }
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn race_name_field_is_normalized_when_name_is_absent() {
        let entry: RaceEntry = serde_json::from_value(json!({
            "round": 3, "date": "2025-04-06", "race_name": "Japanese Grand Prix"
        }))
        .unwrap();
        let race = entry.normalize();
        assert_eq!(race.name, "Japanese Grand Prix");
    }

    #[test]
    fn name_field_wins_over_race_name() {
        let entry: RaceEntry = serde_json::from_value(json!({
            "round": 3, "date": "2025-04-06",
            "name": "Japan", "race_name": "Japanese Grand Prix"
        }))
        .unwrap();
        assert_eq!(entry.normalize().name, "Japan");
    }

    #[test]
    fn partitions_past_and_future_around_today() {
        let info = partition(
            vec![race(1, "2025-03-01"), race(2, "2025-03-15")],
            day("2025-03-10"),
        );
        assert_eq!(info.current_race.unwrap().date, "2025-03-01");
        assert_eq!(info.upcoming_race.unwrap().date, "2025-03-15");
    }

    #[test]
    fn race_dated_today_is_upcoming_not_current() {
        let info = partition(vec![race(1, "2025-03-10")], day("2025-03-10"));
        assert!(info.current_race.is_none());
        assert_eq!(info.upcoming_race.unwrap().round, 1);
    }

    #[test]
    fn all_future_races_leave_current_empty() {
        let info = partition(
            vec![race(1, "2025-03-01"), race(2, "2025-03-15")],
            day("2025-01-01"),
        );
        assert!(info.current_race.is_none());
        assert_eq!(info.upcoming_race.unwrap().round, 1);
    }

    #[test]
    fn all_past_races_leave_upcoming_empty() {
        let info = partition(
            vec![race(1, "2025-03-01"), race(2, "2025-03-15")],
            day("2025-12-01"),
        );
        assert_eq!(info.current_race.unwrap().round, 2);
        assert!(info.upcoming_race.is_none());
    }

    #[test]
    fn unsorted_input_is_sorted_before_partitioning() {
        let info = partition(
            vec![race(3, "2025-05-04"), race(1, "2025-03-01"), race(2, "2025-03-15")],
            day("2025-04-01"),
        );
        assert_eq!(info.current_race.unwrap().round, 2);
        assert_eq!(info.upcoming_race.unwrap().round, 3);
    }

    #[test]
    fn unparsable_dates_are_dropped() {
        let info = partition(
            vec![race(1, "TBD"), race(2, "2025-03-15")],
            day("2025-03-10"),
        );
        assert!(info.current_race.is_none());
        assert_eq!(info.upcoming_race.unwrap().round, 2);
    }

    #[test]
    fn timestamped_dates_parse_at_day_granularity() {
        let info = partition(
            vec![race(1, "2025-03-01T14:00:00Z")],
            day("2025-03-10"),
        );
        assert_eq!(info.current_race.unwrap().round, 1);
    }
}
