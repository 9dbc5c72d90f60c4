use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::models::{NewPrediction, PredictionModel};
use super::repository::PredictionRepository;
use super::scoring::{score_prediction, ScoreResult};
use super::types::{BatchPredictionEntry, BatchSaveResult, PredictionDetail, RoundPredictionStats};
use crate::matches::models::MatchModel;
use crate::matches::repository::MatchRepository;
use crate::round::repository::RoundRepository;
use crate::shared::{AppError, AppState};
use crate::stage::repository::StageRepository;
use crate::team::repository::TeamRepository;

/// Service for storing and scoring player guesses
///
/// The round deadline is enforced here rather than at the API boundary, so
/// no caller can slip a guess in after predictions close.
pub struct PredictionService {
    predictions: Arc<dyn PredictionRepository + Send + Sync>,
    matches: Arc<dyn MatchRepository + Send + Sync>,
    rounds: Arc<dyn RoundRepository + Send + Sync>,
    stages: Arc<dyn StageRepository + Send + Sync>,
    teams: Arc<dyn TeamRepository + Send + Sync>,
}

impl PredictionService {
    pub fn new(
        predictions: Arc<dyn PredictionRepository + Send + Sync>,
        matches: Arc<dyn MatchRepository + Send + Sync>,
        rounds: Arc<dyn RoundRepository + Send + Sync>,
        stages: Arc<dyn StageRepository + Send + Sync>,
        teams: Arc<dyn TeamRepository + Send + Sync>,
    ) -> Self {
        Self {
            predictions,
            matches,
            rounds,
            stages,
            teams,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.prediction_repository),
            Arc::clone(&state.match_repository),
            Arc::clone(&state.round_repository),
            Arc::clone(&state.stage_repository),
            Arc::clone(&state.team_repository),
        )
    }

    /// Saves one guess, upserting the (player, match) row.
    ///
    /// Rejects negative goals, matches that do not accept predictions, and
    /// saves after the round deadline.
    #[instrument(skip(self))]
    pub async fn save_prediction(
        &self,
        player_id: i64,
        match_id: i64,
        home_goals: i32,
        away_goals: i32,
        penalty_winner_id: Option<i64>,
    ) -> Result<PredictionModel, AppError> {
        if home_goals < 0 || away_goals < 0 {
            return Err(AppError::Validation(
                "Goal counts must be non-negative".to_string(),
            ));
        }

        let m = self.require_match(match_id).await?;
        if !m.is_predictable {
            return Err(AppError::Validation(
                "Match does not accept predictions".to_string(),
            ));
        }
        self.require_open_round(&m).await?;

        let saved = self
            .predictions
            .upsert_prediction(&NewPrediction {
                player_id,
                match_id,
                home_goals,
                away_goals,
                penalty_winner_id,
            })
            .await?;

        info!(player_id, match_id, "Prediction saved");
        Ok(saved)
    }

    /// Saves a batch of guesses for one player.
    ///
    /// Incomplete or invalid entries are skipped per item, as are entries
    /// for unknown, closed, or unpredictable matches; the result reports
    /// how many made it through.
    #[instrument(skip(self, entries), fields(entry_count = entries.len()))]
    pub async fn save_batch(
        &self,
        player_id: i64,
        entries: &[BatchPredictionEntry],
    ) -> Result<BatchSaveResult, AppError> {
        let mut result = BatchSaveResult {
            saved: 0,
            skipped: 0,
        };

        for entry in entries {
            let (Some(home_goals), Some(away_goals)) = (entry.home_goals, entry.away_goals) else {
                debug!(match_id = entry.match_id, "Skipping incomplete prediction");
                result.skipped += 1;
                continue;
            };

            match self
                .save_prediction(
                    player_id,
                    entry.match_id,
                    home_goals,
                    away_goals,
                    entry.penalty_winner_id,
                )
                .await
            {
                Ok(_) => result.saved += 1,
                Err(AppError::DatabaseError(msg)) => return Err(AppError::DatabaseError(msg)),
                Err(err) => {
                    debug!(match_id = entry.match_id, error = %err, "Skipping prediction");
                    result.skipped += 1;
                }
            }
        }

        info!(
            player_id,
            saved = result.saved,
            skipped = result.skipped,
            "Batch prediction save finished"
        );
        Ok(result)
    }

    /// Recomputes and stores scores for every prediction of a finished
    /// match. Idempotent; safe to re-run after a score correction. Returns
    /// the number of predictions scored.
    #[instrument(skip(self))]
    pub async fn update_scores_for_match(&self, match_id: i64) -> Result<u32, AppError> {
        let m = self.require_match(match_id).await?;
        if !m.has_final_score() {
            debug!(match_id, "Match has no final score yet, nothing to do");
            return Ok(0);
        }

        let has_penalties = match self.stages.get_stage(m.stage_id).await? {
            Some(stage) => stage.has_penalties,
            None => false,
        };

        let mut scored = 0;
        for prediction in self.predictions.list_by_match(match_id).await? {
            match score_prediction(&m, has_penalties, &prediction) {
                ScoreResult::Points(points) => {
                    self.predictions.set_score(prediction.id, points).await?;
                    scored += 1;
                }
                ScoreResult::NotScored => {
                    // Unreachable past the final-score guard; kept so the
                    // sentinel is handled explicitly.
                    warn!(match_id, prediction_id = prediction.id, "Prediction left unscored");
                }
            }
        }

        info!(match_id, scored, "Prediction scores updated");
        Ok(scored)
    }

    /// One player's guess for a match, joined with match and team context
    #[instrument(skip(self))]
    pub async fn prediction_detail(
        &self,
        player_id: i64,
        match_id: i64,
    ) -> Result<PredictionDetail, AppError> {
        let prediction = self
            .predictions
            .find_prediction(player_id, match_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Prediction not found".to_string()))?;
        let m = self.require_match(match_id).await?;

        let home_team = self.team_name(m.home_team_id).await?;
        let away_team = self.team_name(m.away_team_id).await?;

        Ok(PredictionDetail::new(prediction, &m, home_team, away_team))
    }

    /// Predicted and unpredicted counts over a round's predictable matches
    #[instrument(skip(self))]
    pub async fn round_stats(
        &self,
        player_id: i64,
        round_id: i64,
    ) -> Result<RoundPredictionStats, AppError> {
        let predictable: Vec<i64> = self
            .matches
            .list_by_round(round_id)
            .await?
            .into_iter()
            .filter(|m| m.is_predictable)
            .map(|m| m.id)
            .collect();

        let predicted = self
            .predictions
            .count_for_matches(player_id, &predictable)
            .await?;

        Ok(RoundPredictionStats {
            round_id,
            predicted,
            unpredicted: predictable.len() as i64 - predicted,
        })
    }

    async fn require_match(&self, match_id: i64) -> Result<MatchModel, AppError> {
        self.matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Match not found".to_string()))
    }

    async fn require_open_round(&self, m: &MatchModel) -> Result<(), AppError> {
        let round = self
            .rounds
            .get_round(m.round_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Round not found".to_string()))?;

        if !round.is_open(Utc::now()) {
            return Err(AppError::DeadlineClosed(round.name));
        }
        Ok(())
    }

    async fn team_name(&self, team_id: i64) -> Result<String, AppError> {
        Ok(self
            .teams
            .get_team(team_id)
            .await?
            .map(|team| team.name)
            .unwrap_or_else(|| format!("Team {}", team_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::models::{MatchChanges, MatchStatus};
    use crate::matches::repository::{tests::sample_match, InMemoryMatchRepository};
    use crate::prediction::repository::InMemoryPredictionRepository;
    use crate::round::models::NewRound;
    use crate::round::repository::InMemoryRoundRepository;
    use crate::stage::repository::InMemoryStageRepository;
    use crate::team::models::TeamModel;
    use crate::team::repository::InMemoryTeamRepository;
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    struct Setup {
        service: PredictionService,
        matches: Arc<InMemoryMatchRepository>,
        predictions: Arc<InMemoryPredictionRepository>,
        stages: Arc<InMemoryStageRepository>,
    }

    /// Backend with one open round (deadline one hour out) and one match
    async fn setup() -> (Setup, i64) {
        let rounds = Arc::new(InMemoryRoundRepository::new());
        let matches = Arc::new(InMemoryMatchRepository::new());
        let predictions = Arc::new(InMemoryPredictionRepository::new());
        let stages = Arc::new(InMemoryStageRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::with_teams(vec![
            TeamModel {
                id: 81,
                name: "FC Barcelona".to_string(),
                venue: Some("Camp Nou".to_string()),
            },
            TeamModel {
                id: 86,
                name: "Real Madrid".to_string(),
                venue: None,
            },
        ]));

        let start = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
        rounds
            .insert_or_fetch(&NewRound {
                round_number: 1,
                name: "Round 1".to_string(),
                start_date: start,
                end_date: start + Duration::days(6),
                prediction_deadline: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();
        stages.find_or_create(2021, "REGULAR_SEASON").await.unwrap();

        let kickoff: DateTime<Utc> = Utc::now() + Duration::hours(3);
        let m = matches
            .insert_match(&sample_match(81, 86, kickoff))
            .await
            .unwrap();

        let service = PredictionService::new(
            predictions.clone(),
            matches.clone(),
            rounds,
            stages.clone(),
            teams,
        );

        (
            Setup {
                service,
                matches,
                predictions,
                stages,
            },
            m.id,
        )
    }

    #[tokio::test]
    async fn save_and_read_back_a_prediction() {
        let (s, match_id) = setup().await;

        let saved = s
            .service
            .save_prediction(1, match_id, 2, 1, None)
            .await
            .unwrap();
        assert_eq!(saved.home_goals, 2);
        assert!(saved.score.is_none());

        let detail = s.service.prediction_detail(1, match_id).await.unwrap();
        assert_eq!(detail.home_team, "FC Barcelona");
        assert_eq!(detail.away_team, "Real Madrid");
        assert_eq!(detail.home_goals, 2);
    }

    #[tokio::test]
    async fn negative_goals_are_rejected() {
        let (s, match_id) = setup().await;
        let result = s.service.save_prediction(1, match_id, -1, 0, None).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unpredictable_match_rejects_saves() {
        let (s, match_id) = setup().await;
        s.matches
            .update_match(
                match_id,
                &MatchChanges {
                    is_predictable: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = s.service.save_prediction(1, match_id, 1, 1, None).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn closed_round_rejects_saves() {
        let rounds = Arc::new(InMemoryRoundRepository::new());
        let matches = Arc::new(InMemoryMatchRepository::new());
        let start = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
        rounds
            .insert_or_fetch(&NewRound {
                round_number: 1,
                name: "Round 1".to_string(),
                start_date: start,
                end_date: start + Duration::days(6),
                prediction_deadline: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();
        let m = matches
            .insert_match(&sample_match(81, 86, Utc::now() + Duration::hours(1)))
            .await
            .unwrap();

        let service = PredictionService::new(
            Arc::new(InMemoryPredictionRepository::new()),
            matches,
            rounds,
            Arc::new(InMemoryStageRepository::new()),
            Arc::new(InMemoryTeamRepository::new()),
        );

        let result = service.save_prediction(1, m.id, 1, 1, None).await;
        assert!(matches!(result.unwrap_err(), AppError::DeadlineClosed(_)));
    }

    #[tokio::test]
    async fn batch_save_skips_invalid_entries_and_reports_progress() {
        let (s, match_id) = setup().await;

        let entries = vec![
            BatchPredictionEntry {
                match_id,
                home_goals: Some(2),
                away_goals: Some(1),
                penalty_winner_id: None,
            },
            BatchPredictionEntry {
                match_id,
                home_goals: Some(1),
                away_goals: None, // incomplete
                penalty_winner_id: None,
            },
            BatchPredictionEntry {
                match_id: 999, // unknown match
                home_goals: Some(0),
                away_goals: Some(0),
                penalty_winner_id: None,
            },
        ];

        let result = s.service.save_batch(1, &entries).await.unwrap();
        assert_eq!(result.saved, 1);
        assert_eq!(result.skipped, 2);
        assert!(result.any_saved());
        assert_eq!(s.predictions.prediction_count(), 1);
    }

    #[tokio::test]
    async fn rescoring_covers_all_predictions_and_is_idempotent() {
        let (s, match_id) = setup().await;
        s.service
            .save_prediction(1, match_id, 2, 1, None)
            .await
            .unwrap();
        s.service
            .save_prediction(2, match_id, 1, 1, None)
            .await
            .unwrap();

        s.matches
            .update_match(
                match_id,
                &MatchChanges {
                    status: Some(MatchStatus::Finished),
                    home_score: Some(2),
                    away_score: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let scored = s.service.update_scores_for_match(match_id).await.unwrap();
        assert_eq!(scored, 2);

        let exact = s.predictions.find_prediction(1, match_id).await.unwrap().unwrap();
        let wrong = s.predictions.find_prediction(2, match_id).await.unwrap().unwrap();
        assert_eq!(exact.score, Some(3));
        assert_eq!(wrong.score, Some(0));

        // Re-running writes the same values
        let scored = s.service.update_scores_for_match(match_id).await.unwrap();
        assert_eq!(scored, 2);
        let exact = s.predictions.find_prediction(1, match_id).await.unwrap().unwrap();
        assert_eq!(exact.score, Some(3));
    }

    #[tokio::test]
    async fn rescoring_an_unfinished_match_scores_nothing() {
        let (s, match_id) = setup().await;
        s.service
            .save_prediction(1, match_id, 2, 1, None)
            .await
            .unwrap();

        let scored = s.service.update_scores_for_match(match_id).await.unwrap();
        assert_eq!(scored, 0);

        let prediction = s
            .predictions
            .find_prediction(1, match_id)
            .await
            .unwrap()
            .unwrap();
        assert!(prediction.score.is_none());
    }

    #[tokio::test]
    async fn penalty_stage_awards_the_bonus_through_the_pipeline() {
        let (s, match_id) = setup().await;
        let m = s.matches.get_match(match_id).await.unwrap().unwrap();
        s.stages.set_flags(m.stage_id, true, true, false).await.unwrap();

        s.service
            .save_prediction(1, match_id, 1, 1, Some(81))
            .await
            .unwrap();

        s.matches
            .update_match(
                match_id,
                &MatchChanges {
                    status: Some(MatchStatus::Finished),
                    home_score: Some(1),
                    away_score: Some(1),
                    penalty_winner_id: Some(81),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        s.service.update_scores_for_match(match_id).await.unwrap();

        let prediction = s
            .predictions
            .find_prediction(1, match_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prediction.score, Some(4));
    }

    #[tokio::test]
    async fn round_stats_count_predicted_and_remaining() {
        let (s, match_id) = setup().await;
        s.matches
            .insert_match(&sample_match(1, 2, Utc::now() + Duration::hours(4)))
            .await
            .unwrap();

        s.service
            .save_prediction(1, match_id, 2, 1, None)
            .await
            .unwrap();

        let stats = s.service.round_stats(1, 1).await.unwrap();
        assert_eq!(stats.predicted, 1);
        assert_eq!(stats.unpredicted, 1);
    }
}
