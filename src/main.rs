//! Runner binary: wire up the engine against the production providers and
//! serve a demo calendar query for the configured ranking source.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{info, info_span};

use prospect_schedule::background::BackgroundPool;
use prospect_schedule::cache::{MemoryStore, ScheduleCache};
use prospect_schedule::directory::TeamDirectory;
use prospect_schedule::engine::{EngineConfig, ScheduleEngine};
use prospect_schedule::logging;
use prospect_schedule::overrides::OverrideTable;
use prospect_schedule::providers::{
    CollegeDataClient, ScheduleProvider, ScoreFeed, ScoreboardClient, WorldHoopsClient,
};
use prospect_schedule::rankings::{RankingProvider, StaticRankings};
use prospect_schedule::resolver::TeamResolver;
use prospect_schedule::types::{DateRange, ProviderId, Prospect};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before any config/logging initialization so OnceLock-cached
    // values see the full environment.
    dotenvy::dotenv().ok();

    let _log_guard = logging::init_logging();
    let run_id = logging::get_run_id();

    let source = std::env::var("RANKING_SOURCE").unwrap_or_else(|_| "big-board".to_string());

    let root_span = info_span!("scheduled", run_id = %run_id, source = %source);
    let _enter = root_span.enter();

    info!("Prospect schedule engine starting");

    let overrides = OverrideTable::load_from(
        std::env::var("OVERRIDES_PATH").unwrap_or_else(|_| "data/overrides.json".to_string()),
    );
    let directories = vec![
        TeamDirectory::load_from(
            ProviderId::Domestic,
            std::env::var("DOMESTIC_DIRECTORY_PATH")
                .unwrap_or_else(|_| "data/domestic_teams.json".to_string()),
        ),
        TeamDirectory::load_from(
            ProviderId::International,
            std::env::var("INTERNATIONAL_DIRECTORY_PATH")
                .unwrap_or_else(|_| "data/international_teams.json".to_string()),
        ),
    ];

    let providers: Vec<Arc<dyn ScheduleProvider>> = vec![
        Arc::new(CollegeDataClient::new()),
        Arc::new(WorldHoopsClient::new()),
    ];
    let feed: Arc<dyn ScoreFeed> = Arc::new(ScoreboardClient::new());

    let rankings: Arc<dyn RankingProvider> = Arc::new(demo_rankings(&source));
    let resolver = Arc::new(TeamResolver::new(overrides, directories));
    let cache = Arc::new(ScheduleCache::new(Arc::new(MemoryStore::new())));
    let pool = BackgroundPool::with_defaults();

    let engine = ScheduleEngine::new(
        rankings,
        resolver,
        providers,
        feed,
        cache,
        pool,
        EngineConfig::from_env(),
    );

    // Demo query: the coming week's calendar for the configured source.
    let today = Utc::now().date_naive();
    let range = DateRange::new(today, today + Duration::days(7));
    let payload = engine.schedule(&source, range).await?;

    info!(
        source = %source,
        days = payload.games_by_date.len(),
        games = payload.game_count(),
        "calendar assembled"
    );
    for (date, games) in &payload.games_by_date {
        for game in games {
            info!(
                date = %date,
                matchup = %format!("{} vs {}", game.home_team, game.away_team),
                league = %game.league_label,
                status = %game.status,
                "game"
            );
        }
    }

    Ok(())
}

/// A small fixed board so the binary demonstrates the full pipeline without
/// the ranking-list collaborator deployed alongside it.
fn demo_rankings(source: &str) -> StaticRankings {
    StaticRankings::new().with_source(
        source,
        vec![
            Prospect {
                name: "A. Prospect".to_string(),
                team: "Duke".to_string(),
                league: "ACC".to_string(),
                source: source.to_string(),
            },
            Prospect {
                name: "B. Prospect".to_string(),
                team: "Partizan Mozzart Bet".to_string(),
                league: "Adriatic".to_string(),
                source: source.to_string(),
            },
            Prospect {
                name: "C. Prospect".to_string(),
                team: "Ratiopharm Ulm".to_string(),
                league: "BBL".to_string(),
                source: source.to_string(),
            },
        ],
    )
}
