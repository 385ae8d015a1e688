//! Live score enrichment.
//!
//! A best-effort background pass that overlays in-progress/final scores
//! onto already-merged games without ever blocking the primary response.
//! Scoreboard entries are matched by dateless team-pair key first, then by
//! normalized-name containment; an in-progress game absent from the feed
//! gets one per-event detail fetch before we give up silently.

use std::collections::HashMap;

use tracing::debug;

use crate::normalize::{normalize, pair_key};
use crate::providers::{ScoreFeed, ScoreboardEvent};
use crate::types::{Game, GameStatus};

/// Overlay live scores onto `games`. Returns the enriched games; on any
/// feed failure the input is returned untouched.
pub async fn enrich(feed: &dyn ScoreFeed, mut games: Vec<Game>) -> Vec<Game> {
    let events = match feed.today().await {
        Ok(events) => events,
        Err(e) => {
            debug!(error = %e, "scoreboard feed unavailable, skipping enrichment");
            return games;
        }
    };

    let by_pair: HashMap<String, &ScoreboardEvent> = events
        .iter()
        .map(|e| (pair_key(&e.home_team, &e.away_team), e))
        .collect();

    let mut overlaid = 0usize;
    for game in games.iter_mut() {
        let key = pair_key(&game.home_team, &game.away_team);
        if let Some(event) = by_pair.get(&key) {
            overlay(game, event);
            overlaid += 1;
            continue;
        }

        // Fallback: containment over normalized names, for feeds that
        // abbreviate one side of the matchup.
        if let Some(event) = events.iter().find(|e| loose_match(game, e)) {
            overlay(game, event);
            overlaid += 1;
            continue;
        }

        // A game we believe is live but the feed doesn't list: one detail
        // fetch, then give up silently.
        if game.status == GameStatus::InProgress {
            if let Ok(Some(event)) = feed.event_detail(&game.game_key).await {
                overlay(game, &event);
                overlaid += 1;
            }
        }
    }

    debug!(games = games.len(), overlaid, "score enrichment pass");
    games
}

fn loose_match(game: &Game, event: &ScoreboardEvent) -> bool {
    let game_home = normalize(&game.home_team);
    let game_away = normalize(&game.away_team);
    let event_home = normalize(&event.home_team);
    let event_away = normalize(&event.away_team);

    contains_either(&game_home, &event_home) && contains_either(&game_away, &event_away)
}

fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Copy score/clock/status from a scoreboard entry onto a game. Scores only
/// ever move forward; a feed that omits a score never erases one we have.
fn overlay(game: &mut Game, event: &ScoreboardEvent) {
    if event.home_score.is_some() {
        game.home_score = event.home_score;
    }
    if event.away_score.is_some() {
        game.away_score = event.away_score;
    }
    if event.clock.is_some() {
        game.clock = event.clock.clone();
    }
    game.status = game.status.max(GameStatus::parse(&event.status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFeed {
        events: Vec<ScoreboardEvent>,
        detail: Option<ScoreboardEvent>,
        detail_calls: AtomicUsize,
    }

    #[async_trait]
    impl ScoreFeed for StubFeed {
        async fn today(&self) -> Result<Vec<ScoreboardEvent>> {
            Ok(self.events.clone())
        }

        async fn event_detail(&self, _event_id: &str) -> Result<Option<ScoreboardEvent>> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detail.clone())
        }
    }

    fn game(home: &str, away: &str, status: GameStatus) -> Game {
        Game {
            game_key: format!("2025-12-05|{}|{}", normalize(home), normalize(away)),
            date_key: "2025-12-05".to_string(),
            tipoff: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: None,
            away_score: None,
            status,
            clock: None,
            league_label: "Adriatic".to_string(),
            venue: None,
            source_providers: vec![ProviderId::International],
        }
    }

    fn event(home: &str, away: &str, hs: u32, aws: u32, status: &str) -> ScoreboardEvent {
        ScoreboardEvent {
            event_id: "evt-1".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: Some(hs),
            away_score: Some(aws),
            status: status.to_string(),
            clock: Some("2:10 Q4".to_string()),
        }
    }

    #[tokio::test]
    async fn test_overlay_by_pair_key() {
        let feed = StubFeed {
            // Feed spells names differently; the pair key still matches.
            events: vec![event("KK Partizan", "KK Crvena Zvezda", 88, 85, "in_progress")],
            detail: None,
            detail_calls: AtomicUsize::new(0),
        };

        let enriched = enrich(
            &feed,
            vec![game("Partizan", "Crvena Zvezda", GameStatus::Scheduled)],
        )
        .await;

        assert_eq!(enriched[0].home_score, Some(88));
        assert_eq!(enriched[0].status, GameStatus::InProgress);
        assert_eq!(enriched[0].clock.as_deref(), Some("2:10 Q4"));
    }

    #[tokio::test]
    async fn test_overlay_by_loose_match() {
        let feed = StubFeed {
            events: vec![event("Partizan Belgrade", "Zvezda", 70, 68, "final")],
            detail: None,
            detail_calls: AtomicUsize::new(0),
        };

        let enriched = enrich(
            &feed,
            vec![game("Partizan", "Crvena Zvezda", GameStatus::InProgress)],
        )
        .await;

        assert_eq!(enriched[0].status, GameStatus::Final);
        assert_eq!(enriched[0].home_score, Some(70));
    }

    #[tokio::test]
    async fn test_in_progress_absent_from_feed_gets_one_detail_fetch() {
        let feed = StubFeed {
            events: vec![],
            detail: Some(event("Partizan", "Crvena Zvezda", 90, 87, "final")),
            detail_calls: AtomicUsize::new(0),
        };

        let enriched = enrich(
            &feed,
            vec![game("Partizan", "Crvena Zvezda", GameStatus::InProgress)],
        )
        .await;

        assert_eq!(feed.detail_calls.load(Ordering::SeqCst), 1);
        assert_eq!(enriched[0].home_score, Some(90));
    }

    #[tokio::test]
    async fn test_scheduled_game_absent_from_feed_is_untouched() {
        let feed = StubFeed {
            events: vec![],
            detail: None,
            detail_calls: AtomicUsize::new(0),
        };

        let enriched = enrich(
            &feed,
            vec![game("Partizan", "Crvena Zvezda", GameStatus::Scheduled)],
        )
        .await;

        assert_eq!(feed.detail_calls.load(Ordering::SeqCst), 0);
        assert_eq!(enriched[0].home_score, None);
        assert_eq!(enriched[0].status, GameStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_feed_score_never_erases_known_score() {
        let mut g = game("Partizan", "Crvena Zvezda", GameStatus::InProgress);
        g.home_score = Some(55);
        let feed = StubFeed {
            events: vec![ScoreboardEvent {
                event_id: "evt-1".to_string(),
                home_team: "Partizan".to_string(),
                away_team: "Crvena Zvezda".to_string(),
                home_score: None,
                away_score: None,
                status: "in_progress".to_string(),
                clock: None,
            }],
            detail: None,
            detail_calls: AtomicUsize::new(0),
        };

        let enriched = enrich(&feed, vec![g]).await;
        assert_eq!(enriched[0].home_score, Some(55));
    }
}
