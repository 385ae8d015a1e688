//! Domestic collegiate provider adapter.
//!
//! Wraps the college basketball data REST API: team directory lookup by
//! id/name and schedule lookup by `(teamId, season, leagueId?)`. The
//! provider labels seasons as a single year (the fall year), regardless of
//! league.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config;
use crate::retry::{retry_async, RetryPolicy};
use crate::types::{ProviderId, RawGame, ResolvedTeam, SeasonFormat};

use super::{parse_local_start, urlencode, ScheduleProvider, TeamSearchHit};

/// Raw wire shape for a team from the directory/search endpoint.
#[derive(Debug, Clone, Deserialize)]
struct WireTeam {
    id: i64,
    school: String,
    #[serde(default)]
    conference: Option<String>,
}

/// Raw wire shape for one scheduled game.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGame {
    id: i64,
    /// Local start with offset, e.g. "2025-12-01T19:00:00-05:00".
    start_date: String,
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_points: Option<u32>,
    #[serde(default)]
    away_points: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conference: Option<String>,
    #[serde(default)]
    venue: Option<String>,
}

pub struct CollegeDataClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl CollegeDataClient {
    pub fn new() -> Self {
        Self::with_base_url(config::DOMESTIC_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: std::env::var("DOMESTIC_API_KEY").ok(),
            retry: RetryPolicy::from_env(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, op: &str) -> Result<T> {
        retry_async(&self.retry, op, || async {
            let mut req = self.http.get(url);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            let response = req.send().await.context("request failed")?;
            let response = response.error_for_status().context("bad status")?;
            response.json::<T>().await.context("decode failed")
        })
        .await
    }

    /// One schedule query for a single (season, league filter) combination.
    async fn fetch_games(
        &self,
        team_id: &str,
        season: &str,
        league_id: Option<&str>,
    ) -> Result<Vec<WireGame>> {
        let mut url = format!(
            "{}/games?teamId={}&season={}",
            self.base_url, team_id, season
        );
        if let Some(league) = league_id {
            url.push_str(&format!("&conference={}", league));
        }
        self.get_json(&url, "domestic_fetch_games").await
    }

    fn to_raw(&self, wire: WireGame) -> RawGame {
        let (date_key, tipoff) = parse_local_start(&wire.start_date);
        RawGame {
            provider: ProviderId::Domestic,
            provider_game_id: wire.id.to_string(),
            date_key,
            tipoff,
            home_team: wire.home_team,
            away_team: wire.away_team,
            home_score: wire.home_points,
            away_score: wire.away_points,
            status: wire.status.unwrap_or_else(|| "scheduled".to_string()),
            league_label: wire
                .conference
                .unwrap_or_else(|| "NCAA Division I".to_string()),
            league_id: None,
            venue: wire.venue,
        }
    }
}

impl Default for CollegeDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleProvider for CollegeDataClient {
    fn id(&self) -> ProviderId {
        ProviderId::Domestic
    }

    async fn search_teams(&self, query: &str) -> Result<Vec<TeamSearchHit>> {
        let url = format!("{}/teams?search={}", self.base_url, urlencode(query));
        let teams: Vec<WireTeam> = self.get_json(&url, "domestic_search_teams").await?;
        Ok(teams
            .into_iter()
            .map(|t| TeamSearchHit {
                provider_team_id: t.id.to_string(),
                name: t.school,
                country: Some("USA".to_string()),
                league_id: t.conference,
            })
            .collect())
    }

    async fn season_format(&self, _league_id: Option<&str>) -> SeasonFormat {
        // Provider convention: every collegiate season is labeled by its
        // fall year.
        SeasonFormat::SingleYear
    }

    async fn fetch_schedule(&self, team: &ResolvedTeam, seasons: &[String]) -> Vec<RawGame> {
        // Query each season with and without the league filter: teams show
        // up in secondary competitions the filtered query misses.
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
                        "domestic schedule probe"
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
                        "domestic schedule probe failed, treating as empty"
                    );
                }
            }
        }

        by_game_id.into_values().collect()
    }
}
