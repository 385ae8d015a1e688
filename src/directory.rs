//! Per-provider team directory snapshots.
//!
//! Each provider's team directory is synced out of band by an external
//! collaborator and consumed here read-only. A normalized-name index is
//! rebuilt on load so resolution does not rescan the whole directory per
//! prospect.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::types::{ProviderId, ResolvedTeam, SeasonFormat};

/// One team as known to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryTeam {
    pub provider_team_id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub season_format: SeasonFormat,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
}

impl DirectoryTeam {
    pub fn to_resolved(&self, provider: ProviderId) -> ResolvedTeam {
        ResolvedTeam {
            provider,
            provider_team_id: self.provider_team_id.clone(),
            canonical_name: self.canonical_name.clone(),
            league_id: self.league_id.clone(),
            season_format: self.season_format,
        }
    }
}

/// On-disk snapshot shape.
#[derive(Debug, Serialize, Deserialize)]
struct DirectorySnapshot {
    provider: ProviderId,
    #[serde(default)]
    last_synced: Option<DateTime<Utc>>,
    teams: Vec<DirectoryTeam>,
}

/// A provider's team directory with a normalized-name index.
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    provider: ProviderId,
    teams: Vec<DirectoryTeam>,
    /// normalized name -> indexes into `teams`. Multiple teams can share a
    /// normalized name (farm/reserve squads), so this is a multimap.
    by_norm: HashMap<String, Vec<usize>>,
}

impl TeamDirectory {
    pub fn new(provider: ProviderId, teams: Vec<DirectoryTeam>) -> Self {
        let mut by_norm: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, team) in teams.iter().enumerate() {
            by_norm
                .entry(normalize(&team.canonical_name))
                .or_default()
                .push(idx);
        }
        Self {
            provider,
            teams,
            by_norm,
        }
    }

    pub fn empty(provider: ProviderId) -> Self {
        Self::new(provider, Vec::new())
    }

    /// Load a snapshot file. Missing or malformed snapshots yield an empty
    /// directory (resolution then falls through to the provider search API).
    pub fn load_from<P: AsRef<Path>>(provider: ProviderId, path: P) -> Self {
        let contents = match std::fs::read_to_string(path.as_ref()) {
            Ok(c) => c,
            Err(_) => {
                tracing::info!(
                    provider = %provider,
                    "No directory snapshot at {:?}, starting empty",
                    path.as_ref()
                );
                return Self::empty(provider);
            }
        };

        match serde_json::from_str::<DirectorySnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!(
                    provider = %provider,
                    teams = snapshot.teams.len(),
                    "Loaded directory snapshot"
                );
                Self::new(provider, snapshot.teams)
            }
            Err(e) => {
                tracing::warn!(provider = %provider, "Failed to parse directory snapshot: {}", e);
                Self::empty(provider)
            }
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// All teams whose canonical name normalizes to exactly `norm`.
    pub fn find_exact(&self, norm: &str) -> Vec<&DirectoryTeam> {
        self.by_norm
            .get(norm)
            .map(|idxs| idxs.iter().map(|&i| &self.teams[i]).collect())
            .unwrap_or_default()
    }

    /// Bidirectional substring candidates: directory names containing
    /// `norm`, or contained in it. The shared side must be at least
    /// `min_len` characters so short tokens don't match unrelated clubs.
    pub fn find_substring(&self, norm: &str, min_len: usize) -> Vec<&DirectoryTeam> {
        if norm.len() < min_len {
            return Vec::new();
        }
        self.teams
            .iter()
            .filter(|team| {
                let candidate = normalize(&team.canonical_name);
                if candidate.len() < min_len {
                    return false;
                }
                candidate != norm && (candidate.contains(norm) || norm.contains(&candidate))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, name: &str, country: Option<&str>) -> DirectoryTeam {
        DirectoryTeam {
            provider_team_id: id.to_string(),
            canonical_name: name.to_string(),
            league_id: None,
            country: country.map(|s| s.to_string()),
            season_format: SeasonFormat::YearRange,
            last_synced: None,
        }
    }

    #[test]
    fn test_find_exact_by_normalized_name() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![team("1", "KK Partizan", Some("Serbia")), team("2", "Žalgiris", None)],
        );

        assert_eq!(dir.find_exact("partizan").len(), 1);
        assert_eq!(dir.find_exact("zalgiris")[0].provider_team_id, "2");
        assert!(dir.find_exact("real madrid").is_empty());
    }

    #[test]
    fn test_find_exact_multimap() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![
                team("1", "Partizan", Some("Serbia")),
                team("2", "KK Partizan", Some("Serbia")),
            ],
        );
        assert_eq!(dir.find_exact("partizan").len(), 2);
    }

    #[test]
    fn test_find_substring_bidirectional() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![
                team("1", "Cedevita Olimpija Ljubljana", Some("Slovenia")),
                team("2", "Olimpia Milano", Some("Italy")),
            ],
        );

        // Prospect name is a prefix of the directory name.
        let hits = dir.find_substring("cedevita olimpija", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].provider_team_id, "1");

        // Directory name is contained in the prospect name.
        let hits = dir.find_substring("olimpia milano armani", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].provider_team_id, "2");
    }

    #[test]
    fn test_find_substring_respects_min_len() {
        let dir = TeamDirectory::new(
            ProviderId::International,
            vec![team("1", "Ulm", Some("Germany"))],
        );
        // "ulm" is 3 chars: below the threshold in both directions.
        assert!(dir.find_substring("ulm", 5).is_empty());
        assert!(dir.find_substring("ratiopharm ulm", 5).is_empty());
    }

    #[test]
    fn test_load_missing_snapshot_is_empty() {
        let dir = TeamDirectory::load_from(ProviderId::Domestic, "/nonexistent/dir.json");
        assert!(dir.is_empty());
        assert_eq!(dir.provider(), ProviderId::Domestic);
    }
}
