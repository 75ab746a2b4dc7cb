//! Wire types for the name-mapping endpoints and the normalized lookup table.
//!
//! Both mappings are fetched once per process and cached; a failed fetch
//! degrades to empty tables so display names fall back to raw identifiers
//! instead of taking the pipeline down.

use serde::Deserialize;
use std::collections::HashMap;

/// Driver mapping endpoint: abbreviation → entry carrying the full name.
pub type DriverMappingResponse = HashMap<String, DriverMappingEntry>;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DriverMappingEntry {
    #[serde(default)]
    pub name: String,
}

/// The team mapping endpoint has answered with either an id → name object or
/// a list of `{id, name}` records, depending on upstream version.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum TeamMappingResponse {
    ById(HashMap<String, String>),
    List(Vec<TeamMappingItem>),
}

#[derive(Debug, Deserialize, Clone)]
pub struct TeamMappingItem {
    pub id: String,
    pub name: String,
}

impl TeamMappingResponse {
    fn into_table(self) -> HashMap<String, String> {
        match self {
            TeamMappingResponse::ById(table) => table,
            TeamMappingResponse::List(items) => items
                .into_iter()
                .map(|item| (item.id, item.name))
                .collect(),
        }
    }
}

/// Normalized identifier → display name tables, one per entity kind.
#[derive(Debug, Default, Clone)]
pub struct NameMappings {
    drivers: HashMap<String, String>,
    teams: HashMap<String, String>,
}

impl NameMappings {
    pub fn new(drivers: DriverMappingResponse, teams: TeamMappingResponse) -> Self {
        let drivers = drivers
            .into_iter()
            .filter(|(_, entry)| !entry.name.is_empty())
            .map(|(abbr, entry)| (abbr, entry.name))
            .collect();
        Self {
            drivers,
            teams: teams.into_table(),
        }
    }

    /// Empty tables: every lookup falls back to the raw identifier.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a driver display name from a raw id of the form
    /// `"<teamAbbr>_<driverAbbr>"` or a bare `"<driverAbbr>"`. Unmapped
    /// abbreviations resolve to themselves.
    pub fn driver_name(&self, raw_id: &str) -> String {
        let abbr = raw_id.split('_').nth(1).unwrap_or(raw_id);
        self.drivers
            .get(abbr)
            .cloned()
            .unwrap_or_else(|| abbr.to_owned())
    }

    /// Resolve a constructor display name by id, falling back to the id.
    pub fn team_name(&self, id: &str) -> String {
        self.teams.get(id).cloned().unwrap_or_else(|| id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn driver_table() -> DriverMappingResponse {
        serde_json::from_value(json!({
            "VER": {"name": "Max Verstappen", "number": 1},
            "ANT": {"name": "Andrea Kimi Antonelli"}
        }))
        .unwrap()
    }

    #[test]
    fn composite_id_resolves_through_abbreviation() {
        let mappings = NameMappings::new(driver_table(), TeamMappingResponse::ById(HashMap::new()));
        assert_eq!(mappings.driver_name("RED_VER"), "Max Verstappen");
    }

    #[test]
    fn bare_abbreviation_resolves_directly() {
        let mappings = NameMappings::new(driver_table(), TeamMappingResponse::ById(HashMap::new()));
        assert_eq!(mappings.driver_name("VER"), "Max Verstappen");
    }

    #[test]
    fn unmapped_abbreviation_falls_back_to_itself() {
        let mappings = NameMappings::empty();
        assert_eq!(mappings.driver_name("XYZ"), "XYZ");
        assert_eq!(mappings.driver_name("RED_XYZ"), "XYZ");
        assert_eq!(mappings.team_name("RED"), "RED");
    }

    #[test]
    fn driver_entries_without_names_are_skipped() {
        let table: DriverMappingResponse =
            serde_json::from_value(json!({"VER": {"name": ""}})).unwrap();
        let mappings = NameMappings::new(table, TeamMappingResponse::ById(HashMap::new()));
        assert_eq!(mappings.driver_name("VER"), "VER");
    }

    #[test]
    fn team_mapping_object_and_list_normalize_identically() {
        let by_id: TeamMappingResponse =
            serde_json::from_value(json!({"RED": "Red Bull Racing", "MCL": "McLaren"})).unwrap();
        let list: TeamMappingResponse = serde_json::from_value(json!([
            {"id": "RED", "name": "Red Bull Racing"},
            {"id": "MCL", "name": "McLaren"}
        ]))
        .unwrap();

        let from_object = NameMappings::new(HashMap::new(), by_id);
        let from_list = NameMappings::new(HashMap::new(), list);

        for id in ["RED", "MCL"] {
            assert_eq!(from_object.team_name(id), from_list.team_name(id));
        }
        assert_eq!(from_object.team_name("RED"), "Red Bull Racing");
    }
}
