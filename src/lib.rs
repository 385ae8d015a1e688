//! Cross-Provider Schedule Resolution & Caching Engine
//!
//! Tracks basketball draft prospects and assembles their teams' games into
//! a single per-date calendar. Each prospect's free-text team name is
//! resolved to a canonical identity in every provider that covers it, the
//! team's games are fetched despite each provider's own season-labeling and
//! league taxonomy, duplicates are merged under a derived game key, and the
//! result is served through a tiered, staleness-tolerant cache with
//! background refresh and live-score enrichment.
//!
//! ## Architecture
//!
//! - **normalize**: canonicalizes free-text team names into comparison keys
//! - **resolver**: maps (prospect, team name, league) onto provider team ids
//! - **providers**: one adapter per upstream source, plus the score feed
//! - **merge**: canonical game shape, game keys, cross-provider dedup
//! - **cache**: fresh entry → stale entry → live fetch, with invalidation
//! - **enrich**: best-effort score overlay off the request path
//! - **engine**: the outbound `schedule(source, range)` contract

pub mod background;
pub mod cache;
pub mod config;
pub mod directory;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod overrides;
pub mod providers;
pub mod rankings;
pub mod resolver;
pub mod retry;
pub mod types;
