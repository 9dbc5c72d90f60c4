use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday::matches::repository::InMemoryMatchRepository;
use matchday::prediction::repository::InMemoryPredictionRepository;
use matchday::round::repository::InMemoryRoundRepository;
use matchday::shared::AppState;
use matchday::stage::repository::InMemoryStageRepository;
use matchday::sync::provider::{
    FixtureProvider, HttpFixtureProvider, ProviderConfig, StaticFixtureProvider,
};
use matchday::team::repository::InMemoryTeamRepository;
use matchday::{matches, prediction, round, stage, sync, team, LeagueRef, PredictabilityRules};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env is optional; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchday prediction backend");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let round_repository = Arc::new(InMemoryRoundRepository::new());
    let match_repository = Arc::new(InMemoryMatchRepository::new());
    let stage_repository = Arc::new(InMemoryStageRepository::new());
    let team_repository = Arc::new(InMemoryTeamRepository::new());
    let prediction_repository = Arc::new(InMemoryPredictionRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let round_repository = Arc::new(matchday::round::repository::PostgresRoundRepository::new(pool.clone()));
    // ... and likewise for matches, stages, teams, and predictions.

    let provider = build_provider();
    let rules = PredictabilityRules::new(
        env_i64("PRIMARY_LEAGUE_ID"),
        env_id_set("TRACKED_TEAM_IDS"),
    );
    let leagues = std::env::var("TRACKED_LEAGUES")
        .map(|raw| LeagueRef::parse_list(&raw))
        .unwrap_or_default();
    if leagues.is_empty() {
        warn!("TRACKED_LEAGUES is empty; /sync will have nothing to do");
    }

    let app_state = AppState {
        round_repository,
        match_repository,
        stage_repository,
        team_repository,
        prediction_repository,
        provider,
        rules,
        leagues,
        prediction_lead: chrono::Duration::hours(env_i64("PREDICTION_LEAD_HOURS").unwrap_or(2)),
    };

    // build our application routes
    let app = Router::new()
        .route("/", get(|| async { "matchday" }))
        .route("/sync", post(sync::run_sync))
        .route("/rounds", get(round::round_for_date))
        .route("/rounds/next", get(round::next_open_round))
        .route(
            "/rounds/:round_id",
            get(round::get_round).delete(matches::purge_round),
        )
        .route("/rounds/:round_id/matches", get(matches::list_round_matches))
        .route(
            "/matches/:match_id",
            get(matches::get_match)
                .patch(matches::update_match)
                .delete(matches::delete_match),
        )
        .route("/matches/:match_id/rescore", post(prediction::rescore_match))
        .route("/leagues/:league_id/matches", delete(matches::purge_league))
        .route("/stages/:stage_id", patch(stage::update_stage_flags))
        .route("/teams", put(team::upsert_team))
        .route("/teams/:team_id", get(team::get_team))
        .route(
            "/players/:player_id/predictions",
            put(prediction::save_predictions),
        )
        .route(
            "/players/:player_id/predictions/:match_id",
            get(prediction::get_prediction),
        )
        .route(
            "/players/:player_id/rounds/:round_id/stats",
            get(prediction::round_prediction_stats),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // run our app with hyper
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Server running on http://{bind_addr}");
    axum::serve(listener, app).await.unwrap();
}

/// HTTP provider when credentials are configured, canned fixtures otherwise
fn build_provider() -> Arc<dyn FixtureProvider> {
    let base_url = std::env::var("FOOTBALL_API_BASE_URL").ok();
    let api_token = std::env::var("FOOTBALL_API_TOKEN").ok();

    match (base_url, api_token) {
        (Some(base_url), Some(api_token)) => {
            let config = ProviderConfig {
                base_url,
                api_token,
                season: std::env::var("FOOTBALL_SEASON")
                    .ok()
                    .and_then(|s| s.parse().ok()),
                request_timeout: Duration::from_secs(
                    env_i64("PROVIDER_TIMEOUT_SECS").unwrap_or(20) as u64,
                ),
            };
            match HttpFixtureProvider::new(config) {
                Ok(provider) => return Arc::new(provider),
                Err(err) => warn!(error = %err, "Falling back to the static fixture provider"),
            }
        }
        _ => warn!("FOOTBALL_API_BASE_URL/FOOTBALL_API_TOKEN not set; using the static fixture provider"),
    }

    Arc::new(StaticFixtureProvider::new())
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}

fn env_id_set(name: &str) -> HashSet<i64> {
    std::env::var(name)
        .map(|raw| {
            raw.split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}
