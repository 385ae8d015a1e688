//! Tiered, stale-tolerant schedule cache.
//!
//! Read order: fresh exact-date entry, then the source-wide wildcard entry
//! filtered to the requested dates, then (if the caller allows it) whatever
//! stale entry exists. Entries are advisory: staleness is explicit, a stale
//! entry may be served while a refresh runs, and the last write wins because
//! every entry is idempotently recomputable.
//!
//! The `live board` ranking source is never cached: its membership changes
//! too fast for a multi-minute cache window to stay correct. This is a
//! documented policy, not a bug.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config;
use crate::types::{DateRange, SchedulePayload};

/// One cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub payload: SchedulePayload,
    pub written_at: DateTime<Utc>,
    pub source: String,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl_secs: u64) -> bool {
        let age = Utc::now() - self.written_at;
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < ttl_secs
    }
}

/// The external keyed store behind the cache. Last-write-wins; no
/// transactions needed.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn put(&self, entry: CacheEntry);
    /// Drop every entry whose key starts with `prefix`.
    async fn remove_prefix(&self, prefix: &str);
}

/// In-memory store implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.read().await.get(key).cloned()
    }

    async fn put(&self, entry: CacheEntry) {
        self.inner
            .write()
            .await
            .insert(entry.cache_key.clone(), entry);
    }

    async fn remove_prefix(&self, prefix: &str) {
        self.inner
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone)]
pub enum CacheRead {
    /// Every requested date was covered by a fresh entry.
    Fresh(SchedulePayload),
    /// Data exists but is past its TTL; the caller should trigger a refresh.
    Stale(SchedulePayload),
    Miss,
}

/// The tiered cache over a store.
pub struct ScheduleCache {
    store: Arc<dyn ScheduleStore>,
    ttl_secs: u64,
}

impl ScheduleCache {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            store,
            ttl_secs: config::cache_ttl_secs(),
        }
    }

    pub fn with_ttl(store: Arc<dyn ScheduleStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    fn source_prefix(source: &str) -> String {
        format!("sched:{}:", source)
    }

    pub fn date_key(source: &str, date_key: &str) -> String {
        format!("sched:{}:{}", source, date_key)
    }

    pub fn wildcard_key(source: &str) -> String {
        format!("sched:{}:all", source)
    }

    /// Whether this ranking source bypasses the cache entirely.
    pub fn is_uncached_source(source: &str) -> bool {
        source == config::SOURCE_LIVE_BOARD
    }

    /// Tiered read for a date range.
    pub async fn read(&self, source: &str, range: &DateRange, allow_stale: bool) -> CacheRead {
        if Self::is_uncached_source(source) {
            return CacheRead::Miss;
        }

        // Tier 1: exact-date entries, all fresh.
        let mut combined = SchedulePayload::default();
        let mut all_fresh = true;
        let mut stale_fallback: Option<SchedulePayload> = None;
        for date in range.date_keys() {
            match self.store.get(&Self::date_key(source, &date)).await {
                Some(entry) if entry.is_fresh(self.ttl_secs) => {
                    for (k, v) in entry.payload.games_by_date {
                        combined.games_by_date.insert(k, v);
                    }
                }
                Some(entry) => {
                    all_fresh = false;
                    let fallback = stale_fallback.get_or_insert_with(SchedulePayload::default);
                    for (k, v) in entry.payload.games_by_date {
                        fallback.games_by_date.insert(k, v);
                    }
                }
                None => all_fresh = false,
            }
        }
        if all_fresh {
            debug!(source, "cache hit: exact-date entries");
            return CacheRead::Fresh(combined);
        }

        // Tier 2: the source-wide wildcard entry filtered to the range.
        if let Some(entry) = self.store.get(&Self::wildcard_key(source)).await {
            let filtered = entry.payload.filter_to_range(range);
            if entry.is_fresh(self.ttl_secs) {
                debug!(source, "cache hit: wildcard entry");
                return CacheRead::Fresh(filtered);
            }
            if allow_stale {
                debug!(source, "cache hit: stale wildcard entry");
                return CacheRead::Stale(filtered);
            }
        }

        // Tier 3: stale exact-date data, if permitted.
        if allow_stale {
            if let Some(fallback) = stale_fallback {
                debug!(source, "cache hit: stale exact-date entries");
                return CacheRead::Stale(fallback);
            }
        }

        CacheRead::Miss
    }

    /// Read the source-wide wildcard entry, unfiltered.
    pub async fn read_all(&self, source: &str, allow_stale: bool) -> CacheRead {
        if Self::is_uncached_source(source) {
            return CacheRead::Miss;
        }
        match self.store.get(&Self::wildcard_key(source)).await {
            Some(entry) if entry.is_fresh(self.ttl_secs) => CacheRead::Fresh(entry.payload),
            Some(entry) if allow_stale => CacheRead::Stale(entry.payload),
            _ => CacheRead::Miss,
        }
    }

    /// Write the payload back: one wildcard entry plus one entry per date.
    /// Callers spawn this so the response is never delayed by persistence.
    pub async fn write(&self, source: &str, payload: &SchedulePayload) {
        if Self::is_uncached_source(source) {
            return;
        }

        let now = Utc::now();
        self.store
            .put(CacheEntry {
                cache_key: Self::wildcard_key(source),
                payload: payload.clone(),
                written_at: now,
                source: source.to_string(),
            })
            .await;

        for (date, games) in &payload.games_by_date {
            let mut day = SchedulePayload::default();
            day.games_by_date.insert(date.clone(), games.clone());
            self.store
                .put(CacheEntry {
                    cache_key: Self::date_key(source, date),
                    payload: day,
                    written_at: now,
                    source: source.to_string(),
                })
                .await;
        }
    }

    /// Drop every entry for a ranking source. Called by the ranking-editing
    /// collaborator whenever the underlying list changes, since a cached
    /// schedule keyed by source implicitly depends on which teams are in
    /// that ranking.
    pub async fn invalidate(&self, source: &str) {
        debug!(source, "invalidating cached schedules");
        self.store.remove_prefix(&Self::source_prefix(source)).await;
    }
}
