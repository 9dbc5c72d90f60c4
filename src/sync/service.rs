use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::eligibility::PredictabilityRules;
use super::provider::{FixtureProvider, ProviderFixture};
use super::types::{IngestOutcome, LeagueRef, LeagueSyncReport, SyncSummary};
use crate::matches::models::{MatchStatus, NewMatch};
use crate::matches::repository::MatchRepository;
use crate::round::service::RoundService;
use crate::shared::{AppError, AppState};
use crate::stage::repository::StageRepository;
use crate::team::repository::TeamRepository;

/// Stage assumed when the provider omits one
const DEFAULT_STAGE: &str = "REGULAR_SEASON";
/// Venue placeholder when the home team has none registered
const UNKNOWN_VENUE: &str = "Unknown";

/// Service ingesting provider fixtures into rounds and matches
///
/// Ingestion is idempotent: a fixture whose (home, away, kickoff) tuple is
/// already stored is a silent no-op, so the same feed can be replayed.
pub struct SyncService {
    rounds: RoundService,
    matches: Arc<dyn MatchRepository + Send + Sync>,
    stages: Arc<dyn StageRepository + Send + Sync>,
    teams: Arc<dyn TeamRepository + Send + Sync>,
    provider: Arc<dyn FixtureProvider>,
    rules: PredictabilityRules,
}

impl SyncService {
    pub fn new(
        rounds: RoundService,
        matches: Arc<dyn MatchRepository + Send + Sync>,
        stages: Arc<dyn StageRepository + Send + Sync>,
        teams: Arc<dyn TeamRepository + Send + Sync>,
        provider: Arc<dyn FixtureProvider>,
        rules: PredictabilityRules,
    ) -> Self {
        Self {
            rounds,
            matches,
            stages,
            teams,
            provider,
            rules,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            RoundService::new(Arc::clone(&state.round_repository), state.prediction_lead),
            Arc::clone(&state.match_repository),
            Arc::clone(&state.stage_repository),
            Arc::clone(&state.team_repository),
            Arc::clone(&state.provider),
            state.rules.clone(),
        )
    }

    /// Ingests one fixture for the given league.
    ///
    /// The step order matters: the round is resolved first so the duplicate
    /// probe and the insert agree on the week window, and the duplicate
    /// probe runs before any stage or venue side effects.
    #[instrument(skip(self, fixture))]
    pub async fn ingest_fixture(
        &self,
        league_id: i64,
        fixture: &ProviderFixture,
    ) -> Result<IngestOutcome, AppError> {
        let kickoff = fixture.kickoff()?;
        let home_team_id = fixture.home_team.id;
        let away_team_id = fixture.away_team.id;

        let round = self.rounds.round_for_kickoff(kickoff).await?;

        if self
            .matches
            .find_duplicate(home_team_id, away_team_id, kickoff)
            .await?
            .is_some()
        {
            debug!(
                home_team_id,
                away_team_id,
                kickoff = %kickoff,
                "Fixture already stored, skipping"
            );
            return Ok(IngestOutcome::Duplicate);
        }

        let stage_name = fixture.stage.as_deref().unwrap_or(DEFAULT_STAGE);
        let stage = self.stages.find_or_create(league_id, stage_name).await?;

        let venue = match self.teams.get_team(home_team_id).await? {
            Some(team) => team.venue.unwrap_or_else(|| UNKNOWN_VENUE.to_string()),
            None => UNKNOWN_VENUE.to_string(),
        };

        let status = MatchStatus::from_provider(&fixture.status);
        let is_predictable = self
            .rules
            .is_predictable(league_id, home_team_id, away_team_id);
        let (home_score, away_score) = fixture.full_time();

        self.matches
            .insert_match(&NewMatch {
                round_id: round.id,
                league_id,
                home_team_id,
                away_team_id,
                kickoff,
                stage_id: stage.id,
                matchday: fixture.matchday.unwrap_or(0),
                external_id: fixture.id,
                status,
                home_score,
                away_score,
                is_predictable,
                venue,
            })
            .await?;

        Ok(IngestOutcome::Inserted)
    }

    /// Fetches and ingests one league's fixtures, never propagating the
    /// provider failure past the report.
    #[instrument(skip(self), fields(league = %league.code))]
    pub async fn sync_league(&self, league: &LeagueRef) -> LeagueSyncReport {
        let mut report = LeagueSyncReport {
            league: league.name.clone(),
            code: league.code.clone(),
            added: 0,
            skipped: 0,
            failed: 0,
            error: None,
        };

        let fixtures = match self.provider.league_fixtures(&league.code).await {
            Ok(fixtures) => fixtures,
            Err(err) => {
                warn!(league = %league.code, error = %err, "League fetch failed");
                report.error = Some(err.to_string());
                return report;
            }
        };

        for fixture in &fixtures {
            match self.ingest_fixture(league.id, fixture).await {
                Ok(IngestOutcome::Inserted) => report.added += 1,
                Ok(IngestOutcome::Duplicate) => report.skipped += 1,
                Err(err) => {
                    warn!(league = %league.code, error = %err, "Fixture rejected");
                    report.failed += 1;
                }
            }
        }

        info!(
            league = %league.code,
            added = report.added,
            skipped = report.skipped,
            failed = report.failed,
            "League synchronized"
        );
        report
    }

    /// Synchronizes every configured league; a failing league never stops
    /// its siblings.
    #[instrument(skip(self, leagues))]
    pub async fn sync_leagues(&self, leagues: &[LeagueRef]) -> SyncSummary {
        let mut summary = SyncSummary {
            succeeded: 0,
            failed: 0,
            leagues: Vec::with_capacity(leagues.len()),
        };

        for league in leagues {
            let report = self.sync_league(league).await;
            if report.error.is_none() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.leagues.push(report);
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Sync run complete"
        );
        summary
    }
}
