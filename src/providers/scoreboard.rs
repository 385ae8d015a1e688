//! Lightweight live-scoreboard feed client.
//!
//! Serves the score enricher: today's in-progress/final events with team
//! names and scores, plus a per-event detail endpoint used once when an
//! in-progress game is missing from the main feed. Wire shapes are
//! Option-heavy because the feed omits fields freely.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config;
use crate::retry::{retry_async, RetryPolicy};

/// A clean scoreboard entry after wire decoding.
#[derive(Debug, Clone)]
pub struct ScoreboardEvent {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Provider status string, e.g. "in_progress", "final".
    pub status: String,
    /// Display clock while live, e.g. "4:32 Q3".
    pub clock: Option<String>,
}

/// The live-score feed contract consumed by the enricher.
#[async_trait]
pub trait ScoreFeed: Send + Sync {
    /// Current day's events.
    async fn today(&self) -> Result<Vec<ScoreboardEvent>>;

    /// Per-event detail fetch, attempted once for in-progress games absent
    /// from the main feed.
    async fn event_detail(&self, event_id: &str) -> Result<Option<ScoreboardEvent>>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct WireScoreboard {
    events: Option<Vec<WireEvent>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct WireEvent {
    id: Option<String>,
    status: Option<WireStatus>,
    competitors: Option<Vec<WireCompetitor>>,
}

#[derive(Debug, Deserialize, Clone)]
struct WireStatus {
    state: Option<String>,
    clock: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct WireCompetitor {
    #[serde(rename = "homeAway")]
    home_away: Option<String>,
    name: Option<String>,
    /// Scores arrive as strings.
    score: Option<String>,
}

impl WireEvent {
    fn into_event(self) -> Option<ScoreboardEvent> {
        let event_id = self.id?;
        let competitors = self.competitors?;

        let mut home: Option<(String, Option<u32>)> = None;
        let mut away: Option<(String, Option<u32>)> = None;
        for c in competitors {
            let Some(name) = c.name else { continue };
            let score = c.score.as_deref().and_then(|s| s.parse().ok());
            match c.home_away.as_deref() {
                Some("home") => home = Some((name, score)),
                Some("away") => away = Some((name, score)),
                _ => {}
            }
        }
        let (home_team, home_score) = home?;
        let (away_team, away_score) = away?;

        let (status, clock) = match self.status {
            Some(s) => (
                s.state.unwrap_or_else(|| "scheduled".to_string()),
                s.clock,
            ),
            None => ("scheduled".to_string(), None),
        };

        Some(ScoreboardEvent {
            event_id,
            home_team,
            away_team,
            home_score,
            away_score,
            status,
            clock,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct ScoreboardClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ScoreboardClient {
    pub fn new() -> Self {
        Self::with_base_url(config::SCOREBOARD_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            retry: RetryPolicy::from_env(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, op: &str) -> Result<T> {
        retry_async(&self.retry, op, || async {
            let response = self.http.get(url).send().await.context("request failed")?;
            let response = response.error_for_status().context("bad status")?;
            response.json::<T>().await.context("decode failed")
        })
        .await
    }
}

impl Default for ScoreboardClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreFeed for ScoreboardClient {
    async fn today(&self) -> Result<Vec<ScoreboardEvent>> {
        let url = format!("{}/scoreboard", self.base_url);
        let wire: WireScoreboard = self.get_json(&url, "scoreboard_today").await?;
        Ok(wire
            .events
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireEvent::into_event)
            .collect())
    }

    async fn event_detail(&self, event_id: &str) -> Result<Option<ScoreboardEvent>> {
        let url = format!("{}/events/{}", self.base_url, event_id);
        let wire: WireEvent = self.get_json(&url, "scoreboard_event_detail").await?;
        Ok(wire.into_event())
    }
}
