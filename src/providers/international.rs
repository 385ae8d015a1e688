//! International club-basketball provider adapter.
//!
//! Wraps the international REST API: free-text team search, paginated
//! schedule lookup by `(teamId, season, leagueId?)`, and the league
//! directory used once to classify each league's season-label format.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config;
use crate::retry::{retry_async, RetryPolicy};
use crate::types::{ProviderId, RawGame, ResolvedTeam, SeasonFormat};

use super::{parse_local_start, ScheduleProvider, TeamSearchHit};

/// Pages fetched per schedule probe before giving up. Real seasons fit in
/// two or three pages.
const MAX_PAGES: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
struct WireLeague {
    id: String,
    #[serde(default)]
    name: Option<String>,
    /// "single_year" or "year_range".
    #[serde(default)]
    season_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireSearchTeam {
    id: String,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    league_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireGame {
    id: String,
    /// Local start with offset.
    start: String,
    home: String,
    away: String,
    #[serde(default)]
    home_score: Option<u32>,
    #[serde(default)]
    away_score: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    league: Option<String>,
    #[serde(default)]
    league_id: Option<String>,
    #[serde(default)]
    arena: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireGamesPage {
    games: Vec<WireGame>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

pub struct WorldHoopsClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    /// Season format per league id, filled from the league directory on
    /// first use.
    season_formats: RwLock<HashMap<String, SeasonFormat>>,
}

impl WorldHoopsClient {
    pub fn new() -> Self {
        Self::with_base_url(config::INTERNATIONAL_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: std::env::var("INTERNATIONAL_API_KEY").ok(),
            retry: RetryPolicy::from_env(),
            season_formats: RwLock::new(HashMap::new()),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, op: &str) -> Result<T> {
        retry_async(&self.retry, op, || async {
            let mut req = self.http.get(url);
            if let Some(key) = &self.api_key {
                req = req.header("X-Api-Key", key);
            }
            let response = req.send().await.context("request failed")?;
            let response = response.error_for_status().context("bad status")?;
            response.json::<T>().await.context("decode failed")
        })
        .await
    }

    /// Fetch the league directory and cache every league's season format.
    async fn load_league_directory(&self) {
        let url = format!("{}/leagues", self.base_url);
        let leagues: Vec<WireLeague> = match self.get_json(&url, "intl_league_directory").await {
            Ok(leagues) => leagues,
            Err(e) => {
                warn!(error = %e, "league directory fetch failed");
                return;
            }
        };

        let mut cache = self.season_formats.write().await;
        for league in leagues {
            let format = match league.season_format.as_deref() {
                Some("single_year") => SeasonFormat::SingleYear,
                Some("year_range") => SeasonFormat::YearRange,
                other => {
                    debug!(
                        league = %league.id,
                        name = league.name.as_deref().unwrap_or(""),
                        format = ?other,
                        "league with unclassified season format"
                    );
                    continue;
                }
            };
            cache.insert(league.id, format);
        }
    }

    /// One schedule page for a single (season, league filter, page) probe.
    async fn fetch_games_page(
        &self,
        team_id: &str,
        season: &str,
        league_id: Option<&str>,
        page: u32,
    ) -> Result<WireGamesPage> {
        let mut url = format!(
            "{}/teams/{}/games?season={}&page={}",
            self.base_url, team_id, season, page
        );
        if let Some(league) = league_id {
            url.push_str(&format!("&league={}", league));
        }
        self.get_json(&url, "intl_fetch_games").await
    }

    /// All pages for one (season, league filter) probe. A failed page after
    /// the first returns what was collected so far.
    async fn fetch_games(
        &self,
        team_id: &str,
        season: &str,
        league_id: Option<&str>,
    ) -> Result<Vec<WireGame>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = match self.fetch_games_page(team_id, season, league_id, page).await {
                Ok(batch) => batch,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(team_id, season, page, error = %e, "pagination stopped early");
                    break;
                }
            };

            let got = batch.games.len();
            all.extend(batch.games);

            let last_page = match (batch.page, batch.total_pages) {
                (Some(p), Some(total)) => p >= total,
                _ => got == 0,
            };
            if last_page || page >= MAX_PAGES {
                if page >= MAX_PAGES {
                    warn!(team_id, season, "hit page limit, truncating schedule fetch");
                }
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    fn to_raw(&self, wire: WireGame) -> RawGame {
        let (date_key, tipoff) = parse_local_start(&wire.start);
        RawGame {
            provider: ProviderId::International,
            provider_game_id: wire.id,
            date_key,
            tipoff,
            home_team: wire.home,
            away_team: wire.away,
            home_score: wire.home_score,
            away_score: wire.away_score,
            status: wire.status.unwrap_or_else(|| "scheduled".to_string()),
            league_label: wire.league.unwrap_or_else(|| "International".to_string()),
            league_id: wire.league_id,
            venue: wire.arena,
        }
    }
}

impl Default for WorldHoopsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleProvider for WorldHoopsClient {
    fn id(&self) -> ProviderId {
        ProviderId::International
    }

    async fn search_teams(&self, query: &str) -> Result<Vec<TeamSearchHit>> {
        let url = format!("{}/teams/search?q={}", self.base_url, super::urlencode(query));
        let teams: Vec<WireSearchTeam> = self.get_json(&url, "intl_search_teams").await?;
        Ok(teams
            .into_iter()
            .map(|t| TeamSearchHit {
                provider_team_id: t.id,
                name: t.name,
                country: t.country,
                league_id: t.league_id,
            })
            .collect())
    }

    async fn season_format(&self, league_id: Option<&str>) -> SeasonFormat {
        let Some(league_id) = league_id else {
            return SeasonFormat::YearRange;
        };

        if let Some(format) = self.season_formats.read().await.get(league_id) {
            return *format;
        }

        self.load_league_directory().await;

        self.season_formats
            .read()
            .await
            .get(league_id)
            .copied()
            // Most international leagues run fall-to-spring.
            .unwrap_or(SeasonFormat::YearRange)
    }

    async fn fetch_schedule(&self, team: &ResolvedTeam, seasons: &[String]) -> Vec<RawGame> {
        let mut probes: Vec<(String, Option<String>)> = Vec::new();
        for season in seasons {
            probes.push((season.clone(), None));
            if let Some(league) = &team.league_id {
                probes.push((season.clone(), Some(league.clone())));
            }
        }

        let fetches = probes.iter().map(|(season, league)| {
            self.fetch_games(&team.provider_team_id, season, league.as_deref())
        });

        let mut by_game_id: HashMap<String, RawGame> = HashMap::new();
        for (probe, result) in probes.iter().zip(join_all(fetches).await) {
            match result {
                Ok(games) => {
                    debug!(
                        team = %team.canonical_name,
                        season = %probe.0,
                        games = games.len(),
                        "international schedule probe"
                    );
                    for wire in games {
                        let raw = self.to_raw(wire);
                        by_game_id.entry(raw.provider_game_id.clone()).or_insert(raw);
                    }
                }
                Err(e) => {
                    warn!(
                        team = %team.canonical_name,
                        season = %probe.0,
                        error = %e,
                        "international schedule probe failed, treating as empty"
                    );
                }
            }
        }

        by_game_id.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_game_to_raw() {
        let client = WorldHoopsClient::with_base_url("http://localhost");
        let wire = WireGame {
            id: "ab-7781".to_string(),
            start: "2025-12-05T20:30:00+01:00".to_string(),
            home: "Partizan".to_string(),
            away: "Crvena Zvezda".to_string(),
            home_score: Some(82),
            away_score: Some(79),
            status: Some("Final".to_string()),
            league: Some("ABA League".to_string()),
            league_id: Some("aba".to_string()),
            arena: Some("Beogradska Arena".to_string()),
        };

        let raw = client.to_raw(wire);
        assert_eq!(raw.date_key, "2025-12-05");
        assert_eq!(raw.provider, ProviderId::International);
        assert_eq!(raw.league_id.as_deref(), Some("aba"));
        assert_eq!(raw.home_score, Some(82));
    }

    #[test]
    fn test_wire_games_page_decodes_without_pagination_fields() {
        let json = r#"{"games": []}"#;
        let page: WireGamesPage = serde_json::from_str(json).unwrap();
        assert!(page.games.is_empty());
        assert!(page.page.is_none());
    }
}
