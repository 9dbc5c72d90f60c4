use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{MatchChanges, MatchModel},
    repository::MatchRepository,
};
use crate::prediction::repository::PredictionRepository;
use crate::round::repository::RoundRepository;
use crate::shared::AppError;
use crate::stage::models::PredictionFormat;
use crate::stage::repository::StageRepository;

/// Service for administrative match operations
///
/// Deletions cascade to predictions explicitly so both repository
/// implementations behave the same way.
pub struct MatchService {
    matches: Arc<dyn MatchRepository + Send + Sync>,
    predictions: Arc<dyn PredictionRepository + Send + Sync>,
    rounds: Arc<dyn RoundRepository + Send + Sync>,
    stages: Arc<dyn StageRepository + Send + Sync>,
}

impl MatchService {
    pub fn new(
        matches: Arc<dyn MatchRepository + Send + Sync>,
        predictions: Arc<dyn PredictionRepository + Send + Sync>,
        rounds: Arc<dyn RoundRepository + Send + Sync>,
        stages: Arc<dyn StageRepository + Send + Sync>,
    ) -> Self {
        Self {
            matches,
            predictions,
            rounds,
            stages,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_match(&self, match_id: i64) -> Result<MatchModel, AppError> {
        self.matches
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Match not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_round_matches(&self, round_id: i64) -> Result<Vec<MatchModel>, AppError> {
        self.matches.list_by_round(round_id).await
    }

    /// Entry format for predictions on a match, read off its stage's rule
    /// flags. A match whose stage row is gone reads as the default flags.
    #[instrument(skip(self))]
    pub async fn prediction_format(&self, stage_id: i64) -> Result<PredictionFormat, AppError> {
        Ok(self
            .stages
            .get_stage(stage_id)
            .await?
            .map(|stage| stage.prediction_format())
            .unwrap_or(PredictionFormat::DrawSingle))
    }

    /// Applies an admin update (status, score, venue, predictability,
    /// penalty winner) and returns the updated row.
    #[instrument(skip(self, changes))]
    pub async fn update_match(
        &self,
        match_id: i64,
        changes: MatchChanges,
    ) -> Result<MatchModel, AppError> {
        let updated = self.matches.update_match(match_id, &changes).await?;
        info!(match_id, status = %updated.status, "Match updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_match(&self, match_id: i64) -> Result<(), AppError> {
        self.predictions.delete_by_match(match_id).await?;
        self.matches.delete_match(match_id).await?;
        info!(match_id, "Match deleted");
        Ok(())
    }

    /// Season-reset style removal of a round: its matches, their
    /// predictions, then the round row itself.
    #[instrument(skip(self))]
    pub async fn purge_round(&self, round_id: i64) -> Result<u64, AppError> {
        for m in self.matches.list_by_round(round_id).await? {
            self.predictions.delete_by_match(m.id).await?;
        }
        let removed = self.matches.delete_by_round(round_id).await?;
        self.rounds.delete_round(round_id).await?;

        info!(round_id, removed, "Round purged");
        Ok(removed)
    }

    /// Removes every match of a league along with their predictions.
    /// Rounds stay; other leagues' matches may still reference them.
    #[instrument(skip(self))]
    pub async fn purge_league(&self, league_id: i64) -> Result<u64, AppError> {
        for m in self.matches.list_by_league(league_id).await? {
            self.predictions.delete_by_match(m.id).await?;
        }
        let removed = self.matches.delete_by_league(league_id).await?;

        info!(league_id, removed, "League matches purged");
        Ok(removed)
    }
}
