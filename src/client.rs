//! HTTP client, fetch-with-fallback orchestration and season aggregation.

use crate::mappings::{DriverMappingResponse, NameMappings, TeamMappingResponse};
use crate::schedule::{self, RaceEntry, ScheduleResponse};
use crate::statistics::{DetailedResponse, Shape, SimpleResponse, detect_shape};
use crate::{Constructor, Driver, LoadResult, RaceInfo, SeasonSnapshot};
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

pub type ApiResult<T> = Result<T, ApiError>;

const STATISTICS_BASE: &str = "https://f1fantasytools.com/api/statistics";
const SEASON_DATA_BASE: &str = "https://manpreet1994.pythonanywhere.com";
/// The statistics upstream can take minutes to answer; allow it the same
/// 5 minutes its own proxy deployments do.
const FETCH_TIMEOUT: Duration = Duration::from_secs(300);
/// Load the statistics payload from a local JSON file instead of the
/// network. Read errors propagate into the normal fallback path.
const STATS_FILE_ENV: &str = "F1_FANTASY_STATS_JSON";
const FALLBACK_STATS_JSON: &str = include_str!("../data/fantasy-data.json");

pub const DEFAULT_SEASON: u16 = 2025;

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Upstream locations for one season. `fallback_statistics` defaults to the
/// JSON document bundled with the crate when left unset.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub statistics: String,
    pub fallback_statistics: Option<String>,
    pub driver_mapping: String,
    pub team_mapping: String,
    pub schedule: String,
}

impl Endpoints {
    pub fn for_season(season: u16) -> Self {
        Self {
            statistics: format!("{STATISTICS_BASE}/{season}"),
            fallback_statistics: None,
            driver_mapping: format!("{SEASON_DATA_BASE}/driver_mapping/{season}"),
            team_mapping: format!("{SEASON_DATA_BASE}/team_mapping/{season}"),
            schedule: format!("{SEASON_DATA_BASE}/schedule/{season}"),
        }
    }
}

/// F1 fantasy season statistics client.
///
/// Cloning is cheap and clones share the name-mapping cache.
#[derive(Debug, Clone)]
pub struct FantasyApi {
    client: Client,
    timeout: Duration,
    season: u16,
    endpoints: Endpoints,
    mapping_cache: Arc<OnceCell<NameMappings>>,
}

impl Default for FantasyApi {
    fn default() -> Self {
        Self::new(DEFAULT_SEASON)
    }
}

impl FantasyApi {
    pub fn new(season: u16) -> Self {
        Self::with_endpoints(season, Endpoints::for_season(season))
    }

    pub fn with_endpoints(season: u16, endpoints: Endpoints) -> Self {
        Self {
            client: Client::builder()
                .user_agent("f1-fantasy-api/0.1 (season stats client)")
                .build()
                .unwrap_or_default(),
            timeout: FETCH_TIMEOUT,
            season,
            endpoints,
            mapping_cache: Arc::new(OnceCell::new()),
        }
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    /// Load the aggregated season snapshot.
    ///
    /// Two-tier lookup: the live endpoint first, then the fallback source on
    /// any transport, status or decode failure. A structurally valid but
    /// unrecognized payload still counts as a successful (empty) load.
    /// Never returns an error; `data: None` means both tiers were unusable.
    pub async fn load(&self) -> LoadResult {
        let mappings = self.mappings().await;

        match self.live_snapshot(mappings).await {
            Ok(snapshot) => LoadResult {
                data: Some(snapshot),
                is_stale: false,
            },
            Err(e) => {
                warn!("live statistics fetch failed, trying fallback source: {e}");
                match self.fallback_snapshot(mappings).await {
                    Ok(snapshot) => LoadResult {
                        data: Some(snapshot),
                        is_stale: true,
                    },
                    Err(e) => {
                        warn!("fallback statistics source failed: {e}");
                        LoadResult {
                            data: None,
                            is_stale: true,
                        }
                    }
                }
            }
        }
    }

    /// Fetch the event calendar and partition it around today (UTC).
    /// Never returns an error; both sides are `None` when the fetch fails.
    pub async fn load_schedule(&self) -> RaceInfo {
        match self.get::<ScheduleResponse>(&self.endpoints.schedule).await {
            Ok(response) => {
                let races = response.races.into_iter().map(RaceEntry::normalize).collect();
                schedule::partition(races, Utc::now().date_naive())
            }
            Err(e) => {
                warn!("schedule fetch failed: {e}");
                RaceInfo::default()
            }
        }
    }

    /// Name-mapping tables, fetched on first use and cached for the life of
    /// the client. Concurrent first calls share a single in-flight fetch;
    /// a failed fetch caches empty tables and is not retried.
    pub async fn mappings(&self) -> &NameMappings {
        self.mapping_cache
            .get_or_init(|| async {
                match self.fetch_mappings().await {
                    Ok(mappings) => {
                        info!("name mappings loaded");
                        mappings
                    }
                    Err(e) => {
                        warn!("mapping fetch failed, display names fall back to identifiers: {e}");
                        NameMappings::empty()
                    }
                }
            })
            .await
    }

    async fn fetch_mappings(&self) -> ApiResult<NameMappings> {
        let drivers: DriverMappingResponse = self.get(&self.endpoints.driver_mapping).await?;
        let teams: TeamMappingResponse = self.get(&self.endpoints.team_mapping).await?;
        Ok(NameMappings::new(drivers, teams))
    }

    async fn live_snapshot(&self, mappings: &NameMappings) -> ApiResult<SeasonSnapshot> {
        if let Ok(path) = std::env::var(STATS_FILE_ENV)
            && !path.trim().is_empty()
        {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ApiError::Other(format!("could not read {path}: {e}")))?;
            let raw: Value = serde_json::from_str(&content)
                .map_err(|e| ApiError::Other(format!("invalid statistics json at {path}: {e}")))?;
            return Ok(self.aggregate_raw(&raw, mappings));
        }

        let raw: Value = self.get(&self.endpoints.statistics).await?;
        Ok(self.aggregate_raw(&raw, mappings))
    }

    async fn fallback_snapshot(&self, mappings: &NameMappings) -> ApiResult<SeasonSnapshot> {
        let raw: Value = match &self.endpoints.fallback_statistics {
            Some(url) => self.get(url).await?,
            None => serde_json::from_str(FALLBACK_STATS_JSON)
                .map_err(|e| ApiError::Other(format!("invalid embedded fallback statistics: {e}")))?,
        };
        Ok(self.aggregate_raw(&raw, mappings))
    }

    fn aggregate_raw(&self, raw: &Value, mappings: &NameMappings) -> SeasonSnapshot {
        let shape = detect_shape(raw);
        debug!("statistics payload classified as {shape:?}");
        aggregate(raw, shape, mappings, self.season)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?;

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Aggregation: classified wire payloads → season snapshot
// ---------------------------------------------------------------------------

/// Aggregate a classified statistics payload into a season snapshot.
///
/// Total over all shapes: decode problems and unrecognized structures yield
/// an empty snapshot, never an error. `fallback_season` is used when the
/// payload does not carry a season year itself.
pub fn aggregate(
    raw: &Value,
    shape: Shape,
    mappings: &NameMappings,
    fallback_season: u16,
) -> SeasonSnapshot {
    match shape {
        Shape::Detailed => match serde_json::from_value::<DetailedResponse>(raw.clone()) {
            Ok(response) => aggregate_detailed(response, mappings, fallback_season),
            Err(e) => {
                debug!("detailed payload failed typed decode: {e}");
                empty_snapshot(fallback_season)
            }
        },
        Shape::Simple => match serde_json::from_value::<SimpleResponse>(raw.clone()) {
            Ok(rounds) => aggregate_simple(rounds, mappings, fallback_season),
            Err(e) => {
                debug!("simple payload failed typed decode: {e}");
                empty_snapshot(fallback_season)
            }
        },
        Shape::Unrecognized => {
            debug!("unrecognized statistics payload shape");
            empty_snapshot(fallback_season)
        }
    }
}

fn aggregate_detailed(
    response: DetailedResponse,
    mappings: &NameMappings,
    fallback_season: u16,
) -> SeasonSnapshot {
    let Some(season_result) = response.season_result else {
        return empty_snapshot(fallback_season);
    };

    let mut rounds: Vec<&String> = season_result.race_results.keys().collect();
    sort_rounds(&mut rounds);

    let mut drivers: HashMap<String, Driver> = HashMap::new();
    let mut constructors: HashMap<String, Constructor> = HashMap::new();

    for round in rounds {
        let race = &season_result.race_results[round];
        if race.drivers.is_none() && race.constructors.is_none() {
            continue;
        }

        for result in race.drivers.as_deref().unwrap_or_default() {
            // Inactive entries contribute nothing for the round: no score
            // entry, no price update.
            if !result.is_active {
                continue;
            }
            let driver = drivers.entry(result.id.clone()).or_insert_with(|| {
                let display_name = mappings.driver_name(&result.id);
                let (first_name, last_name) = split_name(&display_name);
                Driver {
                    id: result.id.clone(),
                    display_name,
                    first_name,
                    last_name,
                    price: format_number(result.price),
                    season_score: "0".into(),
                    scores_by_race: BTreeMap::new(),
                }
            });
            accumulate(
                &mut driver.season_score,
                &mut driver.scores_by_race,
                &mut driver.price,
                round,
                result.total_points,
                result.price,
            );
        }

        for result in race.constructors.as_deref().unwrap_or_default() {
            let constructor = constructors.entry(result.id.clone()).or_insert_with(|| Constructor {
                id: result.id.clone(),
                display_name: mappings.team_name(&result.id),
                price: format_number(result.price),
                season_score: "0".into(),
                scores_by_race: BTreeMap::new(),
            });
            accumulate(
                &mut constructor.season_score,
                &mut constructor.scores_by_race,
                &mut constructor.price,
                round,
                result.total_points,
                result.price,
            );
        }
    }

    let season = if season_result.season == 0 {
        fallback_season
    } else {
        season_result.season
    };

    SeasonSnapshot {
        last_updated: Utc::now(),
        season,
        drivers: sorted_drivers(drivers),
        constructors: sorted_constructors(constructors),
    }
}

/// The flat shape carries no composite ids, so entity identity is the bare
/// abbreviation. Two drivers sharing an abbreviation across different teams
/// within one season would collide on this key; the upstream format cannot
/// distinguish them.
fn aggregate_simple(
    rounds_table: SimpleResponse,
    mappings: &NameMappings,
    season: u16,
) -> SeasonSnapshot {
    let mut rounds: Vec<&String> = rounds_table.keys().collect();
    sort_rounds(&mut rounds);

    let mut drivers: HashMap<String, Driver> = HashMap::new();
    for round in rounds {
        for (abbr, entry) in rounds_table[round].driver_entries() {
            let driver = drivers.entry(abbr.clone()).or_insert_with(|| {
                let display_name = mappings.driver_name(&abbr);
                let (first_name, last_name) = split_name(&display_name);
                Driver {
                    id: abbr.clone(),
                    display_name,
                    first_name,
                    last_name,
                    price: format_number(entry.fantasy_cost),
                    season_score: "0".into(),
                    scores_by_race: BTreeMap::new(),
                }
            });
            accumulate(
                &mut driver.season_score,
                &mut driver.scores_by_race,
                &mut driver.price,
                round,
                entry.fantasy_score,
                entry.fantasy_cost,
            );
        }
    }

    // This shape never carried constructor data.
    SeasonSnapshot {
        last_updated: Utc::now(),
        season,
        drivers: sorted_drivers(drivers),
        constructors: Vec::new(),
    }
}

/// Add one round's result to a running entity record: bump the season total,
/// record the per-round score, and overwrite the price with this round's.
fn accumulate(
    season_score: &mut String,
    scores_by_race: &mut BTreeMap<String, String>,
    price: &mut String,
    round: &str,
    points: f64,
    round_price: f64,
) {
    // `as` saturates NaN to 0, so absent or garbage point values can never
    // poison the running total.
    let pts = points as i64;
    let total = season_score.parse::<i64>().unwrap_or(0) + pts;
    *season_score = total.to_string();
    scores_by_race.insert(round.to_owned(), pts.to_string());
    *price = format_number(round_price);
}

fn empty_snapshot(season: u16) -> SeasonSnapshot {
    SeasonSnapshot {
        last_updated: Utc::now(),
        season,
        drivers: Vec::new(),
        constructors: Vec::new(),
    }
}

/// Ascending numeric round order; non-numeric keys sort last. Load-bearing:
/// price must end up reflecting the chronologically last round.
fn sort_rounds(rounds: &mut [&String]) {
    rounds.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

fn sorted_drivers(map: HashMap<String, Driver>) -> Vec<Driver> {
    let mut out: Vec<Driver> = map.into_values().collect();
    out.sort_by(|a, b| {
        score_value(&b.season_score)
            .cmp(&score_value(&a.season_score))
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn sorted_constructors(map: HashMap<String, Constructor>) -> Vec<Constructor> {
    let mut out: Vec<Constructor> = map.into_values().collect();
    out.sort_by(|a, b| {
        score_value(&b.season_score)
            .cmp(&score_value(&a.season_score))
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn score_value(score: &str) -> i64 {
    score.parse().unwrap_or(0)
}

/// First space splits first from last name; single tokens keep the last
/// name empty.
fn split_name(display_name: &str) -> (String, String) {
    match display_name.split_once(' ') {
        Some((first, last)) => (first.to_owned(), last.to_owned()),
        None => (display_name.to_owned(), String::new()),
    }
}

/// Render a wire number the way the upstream displays it: integral values
/// without a trailing ".0", fractional values as-is.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
