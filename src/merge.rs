//! Game merge and dedup across providers.
//!
//! Raw provider games are canonicalized, keyed, and folded so that a game
//! reported by both providers (or reached through two prospects sharing a
//! team) appears exactly once in the calendar. The game key is the engine's
//! central correctness invariant: one real-world event, one key.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::config;
use crate::error::ScheduleError;
use crate::normalize::normalize;
use crate::types::{Game, GameStatus, RawGame};

/// Derive the stable key identifying a real-world event.
///
/// Base form: `date|home|away` over normalized names. When either name is
/// too short to be unambiguous on its own, the league family is appended so
/// a domestic matchup can never collide with an international one that
/// happens to share a short name pair on the same date.
pub fn game_key(date_key: &str, home_norm: &str, away_norm: &str, league_label: &str) -> String {
    let short =
        home_norm.len() <= config::SHORT_NAME_LEN || away_norm.len() <= config::SHORT_NAME_LEN;
    if short {
        let family = if config::is_domestic_league(league_label) {
            "dom"
        } else {
            "intl"
        };
        format!("{}|{}|{}|{}", date_key, home_norm, away_norm, family)
    } else {
        format!("{}|{}|{}", date_key, home_norm, away_norm)
    }
}

/// Convert one raw provider game into the canonical shape.
pub fn canonicalize(raw: &RawGame) -> Game {
    let home_norm = normalize(&raw.home_team);
    let away_norm = normalize(&raw.away_team);
    Game {
        game_key: game_key(&raw.date_key, &home_norm, &away_norm, &raw.league_label),
        date_key: raw.date_key.clone(),
        tipoff: raw.tipoff,
        home_team: raw.home_team.clone(),
        away_team: raw.away_team.clone(),
        home_score: raw.home_score,
        away_score: raw.away_score,
        status: GameStatus::parse(&raw.status),
        clock: None,
        league_label: raw.league_label.clone(),
        venue: raw.venue.clone(),
        source_providers: vec![raw.provider],
    }
}

/// Merge raw games from all providers into deduplicated canonical games.
pub fn merge(raw_games: Vec<RawGame>) -> Vec<Game> {
    let mut by_key: HashMap<String, Game> = HashMap::new();

    for raw in &raw_games {
        let candidate = canonicalize(raw);
        fold(&mut by_key, candidate);
    }

    debug!(
        raw = raw_games.len(),
        merged = by_key.len(),
        "merged provider games"
    );
    by_key.into_values().collect()
}

fn fold(by_key: &mut HashMap<String, Game>, candidate: Game) {
    let key = candidate.game_key.clone();
    let Some(incumbent) = by_key.remove(&key) else {
        by_key.insert(key, candidate);
        return;
    };

    if is_collision(&incumbent, &candidate) {
        let collision = ScheduleError::KeyCollision {
            key: key.clone(),
            incumbent: format!("{} vs {}", incumbent.home_team, incumbent.away_team),
            candidate: format!("{} vs {}", candidate.home_team, candidate.away_team),
        };
        error!("{}; re-keying colliding game instead of dropping it", collision);

        by_key.insert(key.clone(), incumbent);

        // Keep the colliding record under a league-qualified key.
        let requeued_key = format!("{}|{}", key, normalize(&candidate.league_label));
        let mut requeued = candidate;
        requeued.game_key = requeued_key.clone();
        match by_key.remove(&requeued_key) {
            Some(existing) => {
                let merged = merge_pair(existing, requeued);
                by_key.insert(requeued_key, merged);
            }
            None => {
                by_key.insert(requeued_key, requeued);
            }
        }
        return;
    }

    by_key.insert(key, merge_pair(incumbent, candidate));
}

/// Two records under one key that cannot be the same event: tipoffs half a
/// day apart, or league families that disagree.
fn is_collision(a: &Game, b: &Game) -> bool {
    if config::is_domestic_league(&a.league_label) != config::is_domestic_league(&b.league_label) {
        return true;
    }
    if let (Some(ta), Some(tb)) = (a.tipoff, b.tipoff) {
        if (ta - tb).num_hours().abs() > 12 {
            return true;
        }
    }
    false
}

/// Merge two records of the same event. The provider configured as
/// higher-priority for the league wins the base record (and with it the
/// originally reported local tipoff); the other side fills missing fields.
fn merge_pair(a: Game, b: Game) -> Game {
    let priority = config::provider_priority(&a.league_label);
    let (mut base, other) = if b.source_providers.contains(&priority)
        && !a.source_providers.contains(&priority)
    {
        (b, a)
    } else {
        (a, b)
    };

    if base.venue.is_none() {
        base.venue = other.venue;
    }
    if base.home_score.is_none() {
        base.home_score = other.home_score;
    }
    if base.away_score.is_none() {
        base.away_score = other.away_score;
    }
    if base.tipoff.is_none() {
        base.tipoff = other.tipoff;
    }
    if base.clock.is_none() {
        base.clock = other.clock;
    }
    base.status = base.status.max(other.status);

    for provider in other.source_providers {
        if !base.source_providers.contains(&provider) {
            base.source_providers.push(provider);
        }
    }
    base.source_providers.sort();

    base
}
