//! Core types for schedule resolution and the merged calendar payload.
//!
//! These structs capture prospect, team, and game data in a normalized format
//! so games can be matched across providers by event details rather than by
//! provider-specific identifiers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// External data source identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Domestic collegiate/league provider.
    Domestic,
    /// International club-basketball provider.
    International,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domestic => write!(f, "domestic"),
            Self::International => write!(f, "international"),
        }
    }
}

/// How a league labels its seasons. A property of the league, not the team;
/// looked up once per league and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonFormat {
    /// Single calendar year, e.g. "2025".
    SingleYear,
    /// Year range, e.g. "2025-2026".
    YearRange,
}

impl SeasonFormat {
    /// Build the provider-facing season label for a season starting in
    /// `start_year` (the fall year of a fall-to-spring season).
    pub fn label(&self, start_year: i32) -> String {
        match self {
            Self::SingleYear => start_year.to_string(),
            Self::YearRange => format!("{}-{}", start_year, start_year + 1),
        }
    }
}

/// A draft prospect as supplied by the ranking list. Immutable per ranking
/// snapshot; recreated whenever rankings are reloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    /// Display name.
    pub name: String,
    /// Free-text team name as it appears on the ranking list.
    pub team: String,
    /// Declared league label (e.g. "ACC", "Adriatic", "LNB Pro A").
    pub league: String,
    /// Which ranking list this prospect came from.
    pub source: String,
}

impl Prospect {
    /// Best-effort country hint derived from the declared league label,
    /// used to disambiguate fuzzy search results.
    pub fn country_hint(&self) -> Option<&'static str> {
        crate::config::league_country(&self.league)
    }

    /// Whether the declared league is a domestic collegiate competition.
    pub fn is_domestic_league(&self) -> bool {
        crate::config::is_domestic_league(&self.league)
    }
}

/// The mapping from a free-text team name to one provider's canonical team
/// identity. Immutable; many prospects may reference the same resolved team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTeam {
    pub provider: ProviderId,
    /// The provider's own team identifier.
    pub provider_team_id: String,
    /// The provider's canonical display name for the team.
    pub canonical_name: String,
    /// Primary league id in the provider's namespace, if known.
    pub league_id: Option<String>,
    /// Season labeling convention of the team's league.
    pub season_format: SeasonFormat,
}

/// Game lifecycle status in our canonical vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
}

impl GameStatus {
    /// Map a provider status string onto our vocabulary. Unknown strings are
    /// treated as scheduled, which the enricher can upgrade later.
    pub fn parse(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("final") || lower.contains("ended") || lower.contains("ft") {
            Self::Final
        } else if lower.contains("progress")
            || lower.contains("live")
            || lower.contains("halftime")
            || lower.contains("quarter")
        {
            Self::InProgress
        } else {
            Self::Scheduled
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// A game as reported by one provider, before canonicalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGame {
    pub provider: ProviderId,
    /// The provider's own game identifier.
    pub provider_game_id: String,
    /// Calendar date in the event's local context, `YYYY-MM-DD`. Carried
    /// through verbatim; never re-derived from another timezone.
    pub date_key: String,
    /// Tipoff as originally reported by the provider, already carrying its
    /// local offset.
    pub tipoff: Option<DateTime<FixedOffset>>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Provider status string, mapped via [`GameStatus::parse`].
    pub status: String,
    /// League label in the provider's taxonomy.
    pub league_label: String,
    /// League id in the provider's namespace, if the response carries one.
    pub league_id: Option<String>,
    pub venue: Option<String>,
}

/// A merged, canonical game. Immutable once merged except for the
/// score/clock/status fields the enricher overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Derived key identifying the real-world event; see `merge::game_key`.
    pub game_key: String,
    /// Provider-independent calendar date, `YYYY-MM-DD`, local to the event.
    pub date_key: String,
    pub tipoff: Option<DateTime<FixedOffset>>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: GameStatus,
    /// Display clock while in progress, e.g. "4:32 Q3".
    pub clock: Option<String>,
    pub league_label: String,
    pub venue: Option<String>,
    /// Every provider that reported this event.
    pub source_providers: Vec<ProviderId>,
}

/// Inclusive calendar date range for a schedule query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn contains_key(&self, date_key: &str) -> bool {
        match NaiveDate::parse_from_str(date_key, "%Y-%m-%d") {
            Ok(d) => d >= self.from && d <= self.to,
            Err(_) => false,
        }
    }

    /// Iterate the `YYYY-MM-DD` keys of every day in the range.
    pub fn date_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut d = self.from;
        while d <= self.to {
            keys.push(d.format("%Y-%m-%d").to_string());
            d += chrono::Duration::days(1);
        }
        keys
    }
}

/// The merged calendar served to callers: games grouped by date key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub games_by_date: BTreeMap<String, Vec<Game>>,
}

impl SchedulePayload {
    pub fn from_games(games: Vec<Game>) -> Self {
        let mut games_by_date: BTreeMap<String, Vec<Game>> = BTreeMap::new();
        for game in games {
            games_by_date.entry(game.date_key.clone()).or_default().push(game);
        }
        for day in games_by_date.values_mut() {
            day.sort_by(|a, b| a.tipoff.cmp(&b.tipoff).then_with(|| a.game_key.cmp(&b.game_key)));
        }
        Self { games_by_date }
    }

    pub fn is_empty(&self) -> bool {
        self.games_by_date.values().all(|g| g.is_empty())
    }

    pub fn game_count(&self) -> usize {
        self.games_by_date.values().map(|g| g.len()).sum()
    }

    /// Restrict the payload to the requested range.
    pub fn filter_to_range(&self, range: &DateRange) -> Self {
        Self {
            games_by_date: self
                .games_by_date
                .iter()
                .filter(|(key, _)| range.contains_key(key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Restrict the payload to a set of game keys.
    pub fn filter_to_keys(&self, keys: &[String]) -> Self {
        let mut games_by_date: BTreeMap<String, Vec<Game>> = BTreeMap::new();
        for (date, games) in &self.games_by_date {
            let kept: Vec<Game> = games
                .iter()
                .filter(|g| keys.iter().any(|k| k == &g.game_key))
                .cloned()
                .collect();
            if !kept.is_empty() {
                games_by_date.insert(date.clone(), kept);
            }
        }
        Self { games_by_date }
    }

    pub fn all_games(&self) -> Vec<Game> {
        self.games_by_date.values().flatten().cloned().collect()
    }
}
