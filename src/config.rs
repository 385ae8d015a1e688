//! System configuration and league classification tables.
//!
//! This module contains all configuration constants, league mappings, and
//! environment variable parsing for the schedule engine.

use chrono::{Datelike, NaiveDate};

use crate::types::ProviderId;

/// Domestic collegiate provider REST API base URL.
pub const DOMESTIC_API_BASE: &str = "https://api.collegebasketballdata.com";

/// International club-basketball provider REST API base URL.
pub const INTERNATIONAL_API_BASE: &str = "https://api.worldhoops.net/v2";

/// Lightweight live-scoreboard feed base URL.
pub const SCOREBOARD_API_BASE: &str = "https://scores.worldhoops.net/v1";

/// The per-user, frequently edited ranking source that is never cached.
/// Its membership changes too fast for a multi-minute cache window to stay
/// correct; every request for it recomputes live.
pub const SOURCE_LIVE_BOARD: &str = "live-board";

/// Default number of concurrent provider calls per batch.
const DEFAULT_BATCH_SIZE: usize = 5;

/// Default delay between batches of provider calls (milliseconds).
const DEFAULT_BATCH_DELAY_MS: u64 = 250;

/// Default overall timeout around the resolution pipeline (seconds).
const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 10;

/// Default cache entry TTL (seconds).
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Minimum normalized-name length for a substring match to count. Shorter
/// tokens match too many unrelated clubs.
pub const MIN_SUBSTRING_LEN: usize = 5;

/// Normalized team names at or below this length get a league qualifier
/// appended to their game key.
pub const SHORT_NAME_LEN: usize = 3;

/// Background worker pool size.
pub const BACKGROUND_WORKERS: usize = 2;

/// Background job queue depth before submissions are dropped.
pub const BACKGROUND_QUEUE_DEPTH: usize = 64;

/// Concurrent provider calls per batch, from `BATCH_SIZE` env var.
pub fn batch_size() -> usize {
    static CACHED: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0 && n <= 20)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    })
}

/// Inter-batch delay in milliseconds, from `BATCH_DELAY_MS` env var.
pub fn batch_delay_ms() -> u64 {
    static CACHED: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("BATCH_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BATCH_DELAY_MS)
    })
}

/// Overall pipeline timeout in seconds, from `PIPELINE_TIMEOUT_SECS` env var.
pub fn pipeline_timeout_secs() -> u64 {
    static CACHED: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("PIPELINE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PIPELINE_TIMEOUT_SECS)
    })
}

/// Cache TTL in seconds, from `CACHE_TTL_SECS` env var.
pub fn cache_ttl_secs() -> u64 {
    static CACHED: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
    })
}

/// Which provider wins the base record when two providers report the same
/// game. Domestic competitions trust the domestic feed; everything else
/// trusts the international feed.
pub fn provider_priority(league_label: &str) -> ProviderId {
    if is_domestic_league(league_label) {
        ProviderId::Domestic
    } else {
        ProviderId::International
    }
}

/// Whether a league label names a domestic collegiate competition.
pub fn is_domestic_league(league: &str) -> bool {
    let lower = league.to_lowercase();
    lower.contains("ncaa")
        || lower.contains("college")
        || lower.contains("cbb")
        || matches!(
            lower.as_str(),
            "acc" | "sec" | "big ten" | "big 12" | "big east" | "pac-12" | "wcc"
                | "mountain west" | "a-10" | "american" | "overtime elite" | "g league"
        )
}

/// Country hint for an international league label, used to disambiguate
/// fuzzy team-search results.
pub fn league_country(league: &str) -> Option<&'static str> {
    let lower = league.to_lowercase();
    let country = match lower.as_str() {
        "acb" | "liga acb" | "liga endesa" => "Spain",
        "lnb" | "lnb pro a" | "pro a" | "betclic elite" => "France",
        "bbl" | "easycredit bbl" | "bundesliga" => "Germany",
        "lega a" | "lba" | "serie a" => "Italy",
        "bsl" | "turkish league" => "Turkey",
        "vtb" | "vtb united" => "Russia",
        "adriatic" | "aba" | "aba league" => "Serbia",
        "greek league" | "gbl" | "heba a1" => "Greece",
        "nbl" => "Australia",
        "lkl" => "Lithuania",
        "b.league" | "b league" => "Japan",
        _ => return None,
    };
    Some(country)
}

/// Start year of the basketball season containing `today`. Seasons run
/// fall-to-spring, so July is the earliest month we treat as the new season.
pub fn season_start_year(today: NaiveDate) -> i32 {
    if today.month() >= 7 {
        today.year()
    } else {
        today.year() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_priority_by_league_family() {
        assert_eq!(provider_priority("NCAA Division I"), ProviderId::Domestic);
        assert_eq!(provider_priority("ACC"), ProviderId::Domestic);
        assert_eq!(provider_priority("Adriatic"), ProviderId::International);
        assert_eq!(provider_priority("EuroLeague"), ProviderId::International);
    }

    #[test]
    fn test_league_country_hints() {
        assert_eq!(league_country("LNB Pro A"), Some("France"));
        assert_eq!(league_country("Adriatic"), Some("Serbia"));
        assert_eq!(league_country("ACC"), None);
    }

    #[test]
    fn test_season_start_year_boundaries() {
        let nov = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let jul = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(season_start_year(nov), 2025);
        assert_eq!(season_start_year(feb), 2025);
        assert_eq!(season_start_year(jul), 2025);
    }
}
