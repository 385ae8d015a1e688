//! Team resolution: free-text team names to provider team identities.
//!
//! Resolution order per provider, first match wins:
//! 1. curated override table (exact raw-name lookup)
//! 2. exact normalized match against the provider directory
//! 3. bidirectional substring match with a minimum shared length
//! 4. the provider's fuzzy search API, disambiguated by country
//!
//! No match for a provider is a skip, not an error. An ambiguous match is
//! never resolved to an arbitrary pick: it is logged so the fix lands in
//! the override table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config;
use crate::directory::{DirectoryTeam, TeamDirectory};
use crate::error::ScheduleError;
use crate::normalize::normalize;
use crate::overrides::OverrideTable;
use crate::providers::{ScheduleProvider, TeamSearchHit};
use crate::types::{Prospect, ProviderId, ResolvedTeam, SeasonFormat};

pub struct TeamResolver {
    overrides: OverrideTable,
    directories: HashMap<ProviderId, TeamDirectory>,
}

impl TeamResolver {
    pub fn new(overrides: OverrideTable, directories: Vec<TeamDirectory>) -> Self {
        let directories = directories
            .into_iter()
            .map(|d| (d.provider(), d))
            .collect();
        Self {
            overrides,
            directories,
        }
    }

    /// Resolve a prospect's team on every provider. A prospect may resolve
    /// in zero, one, or multiple providers simultaneously.
    pub async fn resolve(
        &self,
        prospect: &Prospect,
        providers: &[Arc<dyn ScheduleProvider>],
    ) -> Vec<ResolvedTeam> {
        let mut resolved = Vec::new();
        for provider in providers {
            if let Some(team) = self.resolve_on(prospect, provider.as_ref()).await {
                resolved.push(team);
            }
        }

        if resolved.is_empty() {
            let miss = ScheduleError::ResolutionMiss {
                team: prospect.team.clone(),
            };
            debug!(prospect = %prospect.name, "{}", miss);
        }

        resolved
    }

    async fn resolve_on(
        &self,
        prospect: &Prospect,
        provider: &dyn ScheduleProvider,
    ) -> Option<ResolvedTeam> {
        let provider_id = provider.id();

        // 1. Curated override. An exclusion entry (no team id) means this
        // name must never resolve here, e.g. a club sharing its name with a
        // national-team entity.
        if let Some(entry) = self.overrides.lookup(&prospect.team, provider_id) {
            let Some(mut team) = entry.to_resolved() else {
                debug!(
                    team = %prospect.team,
                    provider = %provider_id,
                    "override exclusion, skipping provider"
                );
                return None;
            };
            if entry.season_format.is_none() {
                team.season_format = provider.season_format(team.league_id.as_deref()).await;
            }
            debug!(
                team = %prospect.team,
                provider = %provider_id,
                provider_team_id = %team.provider_team_id,
                "resolved via override table"
            );
            return Some(team);
        }

        let norm = normalize(&prospect.team);
        let directory = self.directories.get(&provider_id);

        // 2. Exact normalized directory match.
        if let Some(dir) = directory {
            let candidates = dir.find_exact(&norm);
            if let Some(team) = self.pick_unambiguous(prospect, provider_id, &candidates, "exact") {
                return Some(team.to_resolved(provider_id));
            }
            if !candidates.is_empty() {
                // Ambiguous even after country filtering; handled below.
                return None;
            }

            // 3. Substring match, both directions, length-guarded.
            let candidates = dir.find_substring(&norm, config::MIN_SUBSTRING_LEN);
            if let Some(team) =
                self.pick_unambiguous(prospect, provider_id, &candidates, "substring")
            {
                return Some(team.to_resolved(provider_id));
            }
            if !candidates.is_empty() {
                return None;
            }
        }

        // 4. Provider fuzzy search, restricted to the matching league
        // family: a wrong team under a prospect's name is worse than a gap.
        if !family_matches(prospect, provider_id) {
            return None;
        }
        self.resolve_via_search(prospect, provider).await
    }

    /// Reduce directory candidates to a single pick, or log the ambiguity
    /// and pick nothing.
    fn pick_unambiguous<'a>(
        &self,
        prospect: &Prospect,
        provider_id: ProviderId,
        candidates: &[&'a DirectoryTeam],
        stage: &str,
    ) -> Option<&'a DirectoryTeam> {
        match candidates {
            [] => None,
            [only] => {
                debug!(
                    team = %prospect.team,
                    provider = %provider_id,
                    provider_team_id = %only.provider_team_id,
                    stage,
                    "resolved via directory"
                );
                Some(*only)
            }
            many => {
                let hint = prospect.country_hint();
                let by_country: Vec<&&DirectoryTeam> = many
                    .iter()
                    .filter(|t| t.country.as_deref() == hint && hint.is_some())
                    .collect();
                if let [only] = by_country.as_slice() {
                    debug!(
                        team = %prospect.team,
                        provider = %provider_id,
                        provider_team_id = %only.provider_team_id,
                        stage,
                        "resolved via directory after country disambiguation"
                    );
                    return Some(**only);
                }

                let ambiguous = ScheduleError::AmbiguousMatch {
                    team: prospect.team.clone(),
                    provider: provider_id,
                    candidates: many
                        .iter()
                        .map(|t| t.provider_team_id.clone())
                        .collect(),
                };
                warn!(stage, "{}; add an override entry", ambiguous);
                None
            }
        }
    }

    async fn resolve_via_search(
        &self,
        prospect: &Prospect,
        provider: &dyn ScheduleProvider,
    ) -> Option<ResolvedTeam> {
        let provider_id = provider.id();
        let hits = match provider.search_teams(&prospect.team).await {
            Ok(hits) => hits,
            Err(e) => {
                let unavailable = ScheduleError::ProviderUnavailable {
                    provider: provider_id,
                    reason: e.to_string(),
                };
                debug!("{}", unavailable);
                return None;
            }
        };
        if hits.is_empty() {
            return None;
        }

        let hint = prospect.country_hint();
        let hit: &TeamSearchHit = hits
            .iter()
            .find(|h| hint.is_some() && h.country.as_deref() == hint)
            .or_else(|| hits.first())?;

        let season_format: SeasonFormat =
            provider.season_format(hit.league_id.as_deref()).await;

        debug!(
            team = %prospect.team,
            provider = %provider_id,
            provider_team_id = %hit.provider_team_id,
            "resolved via provider search"
        );

        Some(ResolvedTeam {
            provider: provider_id,
            provider_team_id: hit.provider_team_id.clone(),
            canonical_name: hit.name.clone(),
            league_id: hit.league_id.clone(),
            season_format,
        })
    }
}

/// Whether the prospect's declared league family matches the provider. An
/// unclassifiable league is allowed on both providers and relies on country
/// disambiguation.
fn family_matches(prospect: &Prospect, provider_id: ProviderId) -> bool {
    match provider_id {
        ProviderId::Domestic => prospect.is_domestic_league() || prospect.country_hint().is_none(),
        ProviderId::International => !prospect.is_domestic_league(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryTeam;
    use crate::overrides::OverrideEntry;
    use anyhow::Result;
    use async_trait::async_trait;
    use crate::types::RawGame;

    struct StubProvider {
        id: ProviderId,
        hits: Vec<TeamSearchHit>,
    }

    #[async_trait]
    impl ScheduleProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn search_teams(&self, _query: &str) -> Result<Vec<TeamSearchHit>> {
            Ok(self.hits.clone())
        }

        async fn season_format(&self, _league_id: Option<&str>) -> SeasonFormat {
            SeasonFormat::YearRange
        }

        async fn fetch_schedule(&self, _team: &ResolvedTeam, _seasons: &[String]) -> Vec<RawGame> {
            Vec::new()
        }
    }

    fn dir_team(id: &str, name: &str, country: Option<&str>) -> DirectoryTeam {
        DirectoryTeam {
            provider_team_id: id.to_string(),
            canonical_name: name.to_string(),
            league_id: Some("aba".to_string()),
            country: country.map(|s| s.to_string()),
            season_format: SeasonFormat::YearRange,
            last_synced: None,
        }
    }

    fn prospect(team: &str, league: &str) -> Prospect {
        Prospect {
            name: "X".to_string(),
            team: team.to_string(),
            league: league.to_string(),
            source: "mock".to_string(),
        }
    }

    fn intl_provider() -> Arc<dyn ScheduleProvider> {
        Arc::new(StubProvider {
            id: ProviderId::International,
            hits: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_override_wins_over_directory() {
        let mut overrides = OverrideTable::new();
        overrides.insert(
            "Partizan Mozzart Bet",
            OverrideEntry {
                provider: ProviderId::International,
                provider_team_id: Some("1043".to_string()),
                canonical_name: "Partizan".to_string(),
                league_id: Some("aba".to_string()),
                season_format: Some(SeasonFormat::YearRange),
                note: None,
            },
        );
        // Directory carries the same club under a different id; the
        // curated entry must win.
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![dir_team("9999", "Partizan Mozzart Bet", Some("Serbia"))],
        );

        let resolver = TeamResolver::new(overrides, vec![dir]);
        let resolved = resolver
            .resolve(&prospect("Partizan Mozzart Bet", "Adriatic"), &[intl_provider()])
            .await;

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].provider_team_id, "1043");
    }

    #[tokio::test]
    async fn test_exact_directory_match() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![dir_team("77", "Žalgiris", Some("Lithuania"))],
        );
        let resolver = TeamResolver::new(OverrideTable::new(), vec![dir]);

        let resolved = resolver
            .resolve(&prospect("Zalgiris", "LKL"), &[intl_provider()])
            .await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].provider_team_id, "77");
    }

    #[tokio::test]
    async fn test_ambiguous_substring_yields_nothing() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![
                dir_team("1", "Joventut Badalona", Some("Spain")),
                dir_team("2", "Joventut Badalona B", Some("Spain")),
            ],
        );
        let resolver = TeamResolver::new(OverrideTable::new(), vec![dir]);

        // Both candidates share the country, so country filtering cannot
        // break the tie; the resolver must not pick arbitrarily.
        let resolved = resolver
            .resolve(&prospect("Joventut", "ACB"), &[intl_provider()])
            .await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_exact_broken_by_country() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![
                dir_team("10", "Olympiakos", Some("Greece")),
                dir_team("11", "Olympiakos", Some("Cyprus")),
            ],
        );
        let resolver = TeamResolver::new(OverrideTable::new(), vec![dir]);

        let resolved = resolver
            .resolve(&prospect("Olympiakos", "Greek League"), &[intl_provider()])
            .await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].provider_team_id, "10");
    }

    #[tokio::test]
    async fn test_fuzzy_search_prefers_country_match() {
        let provider: Arc<dyn ScheduleProvider> = Arc::new(StubProvider {
            id: ProviderId::International,
            hits: vec![
                TeamSearchHit {
                    provider_team_id: "500".to_string(),
                    name: "Paris Basketball".to_string(),
                    country: Some("France".to_string()),
                    league_id: Some("lnb".to_string()),
                },
                TeamSearchHit {
                    provider_team_id: "501".to_string(),
                    name: "Paris BC".to_string(),
                    country: Some("Canada".to_string()),
                    league_id: None,
                },
            ],
        });
        let resolver = TeamResolver::new(
            OverrideTable::new(),
            vec![TeamDirectory::empty(ProviderId::International)],
        );

        // Second hit outranks in search order, but the country hint from
        // the declared league must win.
        let resolved = resolver
            .resolve(&prospect("Paris", "LNB Pro A"), &[provider])
            .await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].provider_team_id, "500");
    }

    #[tokio::test]
    async fn test_domestic_prospect_never_fuzzy_matches_international() {
        let provider: Arc<dyn ScheduleProvider> = Arc::new(StubProvider {
            id: ProviderId::International,
            hits: vec![TeamSearchHit {
                provider_team_id: "666".to_string(),
                name: "Duke BC Sofia".to_string(),
                country: Some("Bulgaria".to_string()),
                league_id: None,
            }],
        });
        let resolver = TeamResolver::new(
            OverrideTable::new(),
            vec![TeamDirectory::empty(ProviderId::International)],
        );

        let resolved = resolver.resolve(&prospect("Duke", "ACC"), &[provider]).await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_exclusion_override_skips_provider() {
        let mut overrides = OverrideTable::new();
        overrides.insert(
            "Slovenia",
            OverrideEntry {
                provider: ProviderId::International,
                provider_team_id: None,
                canonical_name: "Slovenia".to_string(),
                league_id: None,
                season_format: None,
                note: Some("national team, not a club".to_string()),
            },
        );
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![dir_team("40", "Slovenia", Some("Slovenia"))],
        );
        let resolver = TeamResolver::new(overrides, vec![dir]);

        let resolved = resolver
            .resolve(&prospect("Slovenia", "Adriatic"), &[intl_provider()])
            .await;
        assert!(resolved.is_empty());
    }
}
