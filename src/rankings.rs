//! Ranking list provider contract.
//!
//! Prospect rosters and rankings are owned by an external collaborator; the
//! engine consumes them read-only through this trait and must tolerate an
//! empty list.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::Prospect;

#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// Ordered prospects for a ranking source. An unknown source yields an
    /// empty list, not an error.
    async fn prospects(&self, source: &str) -> Result<Vec<Prospect>>;
}

/// Fixed in-memory ranking lists, used by the runner binary and tests.
#[derive(Debug, Default)]
pub struct StaticRankings {
    by_source: HashMap<String, Vec<Prospect>>,
}

impl StaticRankings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: &str, prospects: Vec<Prospect>) -> Self {
        self.by_source.insert(source.to_string(), prospects);
        self
    }
}

#[async_trait]
impl RankingProvider for StaticRankings {
    async fn prospects(&self, source: &str) -> Result<Vec<Prospect>> {
        Ok(self.by_source.get(source).cloned().unwrap_or_default())
    }
}
