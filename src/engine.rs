//! Schedule engine: the outbound contract of the crate.
//!
//! A calendar request enters here, reads through the tiered cache, and on a
//! miss runs the resolve → fetch → merge pipeline under an overall deadline.
//! Cache write-back and score enrichment are submitted to the background
//! pool so the response is never delayed by either.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::background::BackgroundPool;
use crate::cache::{CacheRead, ScheduleCache};
use crate::config;
use crate::enrich;
use crate::merge;
use crate::providers::{seasons_to_try, ScheduleProvider, ScoreFeed};
use crate::rankings::RankingProvider;
use crate::resolver::TeamResolver;
use crate::types::{DateRange, Prospect, ProviderId, RawGame, ResolvedTeam, SchedulePayload};

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Concurrent provider calls per batch.
    pub batch_size: usize,
    /// Delay between batches, to respect upstream rate limits.
    pub batch_delay: Duration,
    /// Overall deadline around the full resolution pipeline.
    pub pipeline_timeout: Duration,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            batch_size: config::batch_size(),
            batch_delay: Duration::from_millis(config::batch_delay_ms()),
            pipeline_timeout: Duration::from_secs(config::pipeline_timeout_secs()),
        }
    }
}

pub struct ScheduleEngine {
    rankings: Arc<dyn RankingProvider>,
    resolver: Arc<TeamResolver>,
    providers: Vec<Arc<dyn ScheduleProvider>>,
    feed: Arc<dyn ScoreFeed>,
    cache: Arc<ScheduleCache>,
    pool: BackgroundPool,
    config: EngineConfig,
}

impl ScheduleEngine {
    pub fn new(
        rankings: Arc<dyn RankingProvider>,
        resolver: Arc<TeamResolver>,
        providers: Vec<Arc<dyn ScheduleProvider>>,
        feed: Arc<dyn ScoreFeed>,
        cache: Arc<ScheduleCache>,
        pool: BackgroundPool,
        config: EngineConfig,
    ) -> Self {
        Self {
            rankings,
            resolver,
            providers,
            feed,
            cache,
            pool,
            config,
        }
    }

    /// The primary contract: merged games for a ranking source and date
    /// range.
    pub async fn schedule(&self, source: &str, range: DateRange) -> Result<SchedulePayload> {
        info!(source, from = %range.from, to = %range.to, "schedule request");

        // The live board recomputes on every request; see cache module docs.
        if ScheduleCache::is_uncached_source(source) {
            let payload = self.compute_live(source).await?;
            self.submit_enrichment(source, payload.clone());
            return Ok(payload.filter_to_range(&range));
        }

        if let CacheRead::Fresh(payload) = self.cache.read(source, &range, false).await {
            self.submit_enrichment(source, payload.clone());
            return Ok(payload);
        }

        match self.compute_live(source).await {
            Ok(payload) => {
                self.submit_write_back(source, payload.clone());
                self.submit_enrichment(source, payload.clone());
                Ok(payload.filter_to_range(&range))
            }
            Err(e) => {
                // Serve the last good payload before surfacing anything.
                warn!(source, error = %e, "pipeline failed, trying stale cache");
                match self.cache.read(source, &range, true).await {
                    CacheRead::Fresh(payload) | CacheRead::Stale(payload) => Ok(payload),
                    CacheRead::Miss => Err(e),
                }
            }
        }
    }

    /// Narrower lookup for specific already-known games.
    pub async fn schedule_for_games(
        &self,
        source: &str,
        game_keys: &[String],
    ) -> Result<SchedulePayload> {
        let payload = if ScheduleCache::is_uncached_source(source) {
            self.compute_live(source).await?
        } else {
            match self.cache.read_all(source, true).await {
                CacheRead::Fresh(payload) | CacheRead::Stale(payload) => payload,
                CacheRead::Miss => {
                    let payload = self.compute_live(source).await?;
                    self.submit_write_back(source, payload.clone());
                    payload
                }
            }
        };
        Ok(payload.filter_to_keys(game_keys))
    }

    /// Invalidation hook for the ranking-editing collaborator.
    pub async fn invalidate(&self, source: &str) {
        self.cache.invalidate(source).await;
    }

    /// Run the full resolution pipeline under the configured deadline.
    /// Batches that miss the deadline are skipped and whatever completed is
    /// merged: a partial calendar beats an error.
    async fn compute_live(&self, source: &str) -> Result<SchedulePayload> {
        let deadline = Instant::now() + self.config.pipeline_timeout;

        let prospects = self.rankings.prospects(source).await.map_err(|e| {
            warn!(source, error = %e, "ranking list unavailable");
            e
        })?;
        if prospects.is_empty() {
            debug!(source, "ranking list empty, serving empty calendar");
            return Ok(SchedulePayload::default());
        }

        let teams = self.resolve_all(&prospects, deadline).await;
        info!(
            source,
            prospects = prospects.len(),
            teams = teams.len(),
            "resolution complete"
        );

        let raw_games = self.fetch_all(&teams, deadline).await;
        let merged = merge::merge(raw_games);
        info!(source, games = merged.len(), "pipeline complete");

        Ok(SchedulePayload::from_games(merged))
    }

    /// Resolve every prospect in rate-limited batches, deduplicating teams
    /// shared by multiple prospects.
    async fn resolve_all(
        &self,
        prospects: &[Prospect],
        deadline: Instant,
    ) -> Vec<ResolvedTeam> {
        let mut teams: BTreeMap<(ProviderId, String), ResolvedTeam> = BTreeMap::new();

        for (i, chunk) in prospects.chunks(self.config.batch_size).enumerate() {
            let Some(remaining) = remaining_budget(deadline) else {
                warn!("deadline hit during resolution, continuing with partial teams");
                break;
            };

            let batch = join_all(
                chunk
                    .iter()
                    .map(|p| self.resolver.resolve(p, &self.providers)),
            );
            match tokio::time::timeout(remaining, batch).await {
                Ok(resolved_lists) => {
                    for resolved in resolved_lists.into_iter().flatten() {
                        teams
                            .entry((resolved.provider, resolved.provider_team_id.clone()))
                            .or_insert(resolved);
                    }
                }
                Err(_) => {
                    warn!(batch = i, "resolution batch timed out, skipping remainder");
                    break;
                }
            }

            if (i + 1) * self.config.batch_size < prospects.len() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        teams.into_values().collect()
    }

    /// Fetch every team's schedule in rate-limited batches. Adapters are
    /// infallible by contract, so a batch is all-settled by construction:
    /// one team's upstream failure never cancels its siblings.
    async fn fetch_all(&self, teams: &[ResolvedTeam], deadline: Instant) -> Vec<RawGame> {
        let today = Utc::now().date_naive();
        let mut raw_games = Vec::new();

        for (i, chunk) in teams.chunks(self.config.batch_size).enumerate() {
            let Some(remaining) = remaining_budget(deadline) else {
                warn!("deadline hit during fetch, merging partial results");
                break;
            };

            let batch = join_all(chunk.iter().filter_map(|team| {
                let provider = self.provider_for(team.provider)?;
                let seasons = seasons_to_try(team.season_format, today);
                Some(async move { provider.fetch_schedule(team, &seasons).await })
            }));
            match tokio::time::timeout(remaining, batch).await {
                Ok(results) => raw_games.extend(results.into_iter().flatten()),
                Err(_) => {
                    warn!(batch = i, "fetch batch timed out, merging partial results");
                    break;
                }
            }

            if (i + 1) * self.config.batch_size < teams.len() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        raw_games
    }

    fn provider_for(&self, id: ProviderId) -> Option<&Arc<dyn ScheduleProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Fire-and-forget cache write-back.
    fn submit_write_back(&self, source: &str, payload: SchedulePayload) {
        let cache = self.cache.clone();
        let source = source.to_string();
        self.pool.submit("cache-write", async move {
            cache.write(&source, &payload).await;
            Ok(())
        });
    }

    /// Detached enrichment pass: overlay live scores, then refresh the
    /// cached copy so the next read serves them. No caller-visible timeout;
    /// a pass that never finishes is simply superseded by the next one.
    fn submit_enrichment(&self, source: &str, payload: SchedulePayload) {
        let feed = self.feed.clone();
        let cache = self.cache.clone();
        let source = source.to_string();
        self.pool.submit("score-enrich", async move {
            let games = payload.all_games();
            if games.is_empty() {
                return Ok(());
            }
            let enriched = enrich::enrich(feed.as_ref(), games).await;
            let enriched = SchedulePayload::from_games(enriched);
            cache.write(&source, &enriched).await;
            Ok(())
        });
    }
}

/// Time left before `deadline`, or `None` once it has passed.
fn remaining_budget(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if now >= deadline {
        None
    } else {
        Some(deadline - now)
    }
}
