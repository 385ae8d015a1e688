//! Provider adapters.
//!
//! One adapter per external data source. Each adapter hides authentication,
//! the provider's season-label format, optional league filters, and response
//! pagination behind the [`ScheduleProvider`] trait. Adapters never fail for
//! "no data": an empty result is a valid business outcome, and network
//! failures are retried once, then logged and converted to empty.

mod domestic;
mod international;
mod scoreboard;

pub use domestic::CollegeDataClient;
pub use international::WorldHoopsClient;
pub use scoreboard::{ScoreFeed, ScoreboardClient, ScoreboardEvent};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config;
use crate::types::{ProviderId, RawGame, ResolvedTeam, SeasonFormat};

/// A hit from a provider's free-text team search API.
#[derive(Debug, Clone)]
pub struct TeamSearchHit {
    pub provider_team_id: String,
    pub name: String,
    pub country: Option<String>,
    pub league_id: Option<String>,
}

/// A schedule data source.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Free-text team search, the resolver's last resort.
    async fn search_teams(&self, query: &str) -> Result<Vec<TeamSearchHit>>;

    /// Season labeling convention for a league, looked up once and cached
    /// per league by adapters that expose a league directory.
    async fn season_format(&self, league_id: Option<&str>) -> SeasonFormat;

    /// Fetch the team's raw games for the given season labels. Probes run
    /// concurrently and results are unioned by provider game id. Infallible
    /// by contract: failures degrade to missing games plus a diagnostic.
    async fn fetch_schedule(&self, team: &ResolvedTeam, seasons: &[String]) -> Vec<RawGame>;
}

/// Season labels to probe for a team: the season containing `today`, then
/// the previous one for the early-season boundary. A label the provider
/// doesn't recognize yields an empty result and the next label is tried.
pub fn seasons_to_try(format: SeasonFormat, today: NaiveDate) -> Vec<String> {
    let start = config::season_start_year(today);
    vec![format.label(start), format.label(start - 1)]
}

/// Minimal percent-encoding for query values.
pub(crate) fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') {
                c.to_string()
            } else if c == ' ' {
                "+".to_string()
            } else {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect()
}

/// Parse a provider timestamp carrying its own offset, keeping the local
/// calendar date. Falls back to the leading `YYYY-MM-DD` when the timestamp
/// is date-only or malformed, so the calendar date is never re-derived from
/// a different timezone.
pub(crate) fn parse_local_start(
    start: &str,
) -> (String, Option<chrono::DateTime<chrono::FixedOffset>>) {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(start) {
        return (dt.date_naive().format("%Y-%m-%d").to_string(), Some(dt));
    }
    let date_key = start.get(..10).unwrap_or(start).to_string();
    (date_key, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasons_to_try_year_range() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        assert_eq!(
            seasons_to_try(SeasonFormat::YearRange, today),
            vec!["2025-2026", "2024-2025"]
        );
    }

    #[test]
    fn test_seasons_to_try_single_year() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        assert_eq!(
            seasons_to_try(SeasonFormat::SingleYear, today),
            vec!["2025", "2024"]
        );
    }

    #[test]
    fn test_parse_local_start_keeps_local_date() {
        // 11pm local on Dec 1 is Dec 2 in UTC; the local date must win.
        let (date_key, tipoff) = parse_local_start("2025-12-01T23:00:00-05:00");
        assert_eq!(date_key, "2025-12-01");
        assert!(tipoff.is_some());
    }

    #[test]
    fn test_parse_local_start_date_only() {
        let (date_key, tipoff) = parse_local_start("2025-12-01");
        assert_eq!(date_key, "2025-12-01");
        assert!(tipoff.is_none());
    }
}
