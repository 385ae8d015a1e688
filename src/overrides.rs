//! Curated team override table.
//!
//! Hand-maintained mappings from historical/ambiguous raw team names to
//! fixed provider team ids. The table exists because automated matching
//! over-generalizes short or heavily sponsored club names; it is shipped as
//! versioned data, not code, so corrections land without a redeploy.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::types::{ProviderId, ResolvedTeam, SeasonFormat};

/// One curated mapping for a raw team name on one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub provider: ProviderId,
    /// The fixed provider team id. `None` is an explicit exclusion: this
    /// raw name must never resolve on this provider (e.g. a club sharing
    /// its name with a national-team entity).
    pub provider_team_id: Option<String>,
    pub canonical_name: String,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub season_format: Option<SeasonFormat>,
    /// Maintainer note: why this entry exists.
    #[serde(default)]
    pub note: Option<String>,
}

impl OverrideEntry {
    /// Build the resolved team for this entry, or `None` for exclusions.
    pub fn to_resolved(&self) -> Option<ResolvedTeam> {
        let provider_team_id = self.provider_team_id.clone()?;
        Some(ResolvedTeam {
            provider: self.provider,
            provider_team_id,
            canonical_name: self.canonical_name.clone(),
            league_id: self.league_id.clone(),
            season_format: self.season_format.unwrap_or(SeasonFormat::SingleYear),
        })
    }
}

/// Override file format enum for backward compatibility.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverrideFileFormat {
    /// V2: versioned wrapper.
    V2 {
        #[allow(dead_code)]
        version: u32,
        overrides: HashMap<String, Vec<OverrideEntry>>,
    },
    /// V1: bare raw-name map.
    V1(HashMap<String, Vec<OverrideEntry>>),
}

/// The loaded override table, keyed by raw team name exactly as it appears
/// on ranking lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverrideTable {
    overrides: HashMap<String, Vec<OverrideEntry>>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. A missing file yields an empty table; a
    /// malformed file is logged and also yields an empty table, so a bad
    /// data push degrades matching instead of taking the engine down.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let contents = match std::fs::read_to_string(path.as_ref()) {
            Ok(c) => c,
            Err(_) => {
                tracing::info!(
                    "No override table found at {:?}, starting empty",
                    path.as_ref()
                );
                return Self::default();
            }
        };

        match serde_json::from_str::<OverrideFileFormat>(&contents) {
            Ok(OverrideFileFormat::V2 { overrides, .. }) => {
                tracing::debug!("Loaded override table (v2 format), {} names", overrides.len());
                Self { overrides }
            }
            Ok(OverrideFileFormat::V1(overrides)) => {
                tracing::debug!(
                    "Loaded override table (v1 legacy format), {} names",
                    overrides.len()
                );
                Self { overrides }
            }
            Err(e) => {
                tracing::warn!("Failed to parse override table: {}", e);
                Self::default()
            }
        }
    }

    /// Save in the current (v2) format.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        #[derive(Serialize)]
        struct V2<'a> {
            version: u32,
            overrides: &'a HashMap<String, Vec<OverrideEntry>>,
        }
        let json = serde_json::to_string_pretty(&V2 {
            version: 2,
            overrides: &self.overrides,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Exact raw-name lookup for one provider. Returns the entry even when
    /// it is an exclusion; the resolver decides what that means.
    pub fn lookup(&self, raw_name: &str, provider: ProviderId) -> Option<&OverrideEntry> {
        self.overrides
            .get(raw_name.trim())?
            .iter()
            .find(|e| e.provider == provider)
    }

    pub fn insert(&mut self, raw_name: &str, entry: OverrideEntry) {
        self.overrides
            .entry(raw_name.trim().to_string())
            .or_default()
            .push(entry);
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partizan_entry() -> OverrideEntry {
        OverrideEntry {
            provider: ProviderId::International,
            provider_team_id: Some("1043".to_string()),
            canonical_name: "Partizan".to_string(),
            league_id: Some("aba".to_string()),
            season_format: Some(SeasonFormat::YearRange),
            note: Some("sponsor-name churn".to_string()),
        }
    }

    #[test]
    fn test_lookup_by_raw_name_and_provider() {
        let mut table = OverrideTable::new();
        table.insert("Partizan Mozzart Bet", partizan_entry());

        let hit = table
            .lookup("Partizan Mozzart Bet", ProviderId::International)
            .unwrap();
        assert_eq!(hit.provider_team_id.as_deref(), Some("1043"));
        assert!(table
            .lookup("Partizan Mozzart Bet", ProviderId::Domestic)
            .is_none());
        assert!(table.lookup("Partizan", ProviderId::International).is_none());
    }

    #[test]
    fn test_exclusion_entry_resolves_to_none() {
        let entry = OverrideEntry {
            provider: ProviderId::International,
            provider_team_id: None,
            canonical_name: "Slovenia".to_string(),
            league_id: None,
            season_format: None,
            note: Some("national team, not a club".to_string()),
        };
        assert!(entry.to_resolved().is_none());
    }

    #[test]
    fn test_load_v2_format() {
        let v2_json = r#"{
            "version": 2,
            "overrides": {
                "Partizan Mozzart Bet": [{
                    "provider": "international",
                    "provider_team_id": "1043",
                    "canonical_name": "Partizan",
                    "league_id": "aba",
                    "season_format": "year_range"
                }]
            }
        }"#;

        let test_file = std::env::temp_dir().join("overrides_v2_test.json");
        std::fs::write(&test_file, v2_json).unwrap();
        let table = OverrideTable::load_from(&test_file);
        let _ = std::fs::remove_file(&test_file);

        assert_eq!(table.len(), 1);
        let hit = table
            .lookup("Partizan Mozzart Bet", ProviderId::International)
            .unwrap();
        assert_eq!(hit.season_format, Some(SeasonFormat::YearRange));
    }

    #[test]
    fn test_load_v1_legacy_format() {
        let v1_json = r#"{
            "Cedevita Olimpija": [{
                "provider": "international",
                "provider_team_id": "882",
                "canonical_name": "Cedevita Olimpija"
            }]
        }"#;

        let test_file = std::env::temp_dir().join("overrides_v1_test.json");
        std::fs::write(&test_file, v1_json).unwrap();
        let table = OverrideTable::load_from(&test_file);
        let _ = std::fs::remove_file(&test_file);

        assert_eq!(table.len(), 1);
        assert!(table
            .lookup("Cedevita Olimpija", ProviderId::International)
            .is_some());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let table = OverrideTable::load_from("/nonexistent/overrides.json");
        assert!(table.is_empty());
    }

    #[test]
    fn test_save_round_trip() {
        let mut table = OverrideTable::new();
        table.insert("Partizan Mozzart Bet", partizan_entry());

        let test_file = std::env::temp_dir().join("overrides_save_test.json");
        table.save_to(&test_file).unwrap();
        let loaded = OverrideTable::load_from(&test_file);
        let _ = std::fs::remove_file(&test_file);

        assert_eq!(loaded.len(), 1);
        let contents_ok = loaded
            .lookup("Partizan Mozzart Bet", ProviderId::International)
            .is_some();
        assert!(contents_ok);
    }
}
