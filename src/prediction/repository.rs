use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewPrediction, PredictionModel};
use crate::shared::AppError;

/// Trait for prediction repository operations
#[async_trait]
pub trait PredictionRepository {
    /// Inserts the guess or updates the existing (player, match) row;
    /// never produces a second row for the same pair
    async fn upsert_prediction(&self, p: &NewPrediction) -> Result<PredictionModel, AppError>;
    async fn find_prediction(
        &self,
        player_id: i64,
        match_id: i64,
    ) -> Result<Option<PredictionModel>, AppError>;
    async fn list_by_match(&self, match_id: i64) -> Result<Vec<PredictionModel>, AppError>;
    /// Writes an awarded score; only the scoring engine calls this
    async fn set_score(&self, prediction_id: i64, score: i32) -> Result<(), AppError>;
    /// How many of the given matches the player has predicted
    async fn count_for_matches(&self, player_id: i64, match_ids: &[i64])
        -> Result<i64, AppError>;
    async fn delete_by_match(&self, match_id: i64) -> Result<u64, AppError>;
}

/// In-memory implementation of PredictionRepository for development and
/// testing
pub struct InMemoryPredictionRepository {
    inner: Mutex<Inner>,
}

struct Inner {
    predictions: HashMap<i64, PredictionModel>,
    next_id: i64,
}

impl Default for InMemoryPredictionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                predictions: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn prediction_count(&self) -> usize {
        self.inner.lock().unwrap().predictions.len()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    #[instrument(skip(self, p))]
    async fn upsert_prediction(&self, p: &NewPrediction) -> Result<PredictionModel, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = inner
            .predictions
            .values_mut()
            .find(|row| row.player_id == p.player_id && row.match_id == p.match_id)
        {
            existing.home_goals = p.home_goals;
            existing.away_goals = p.away_goals;
            existing.penalty_winner_id = p.penalty_winner_id;
            existing.created_at = now;
            debug!(
                player_id = p.player_id,
                match_id = p.match_id,
                "Prediction updated in memory"
            );
            return Ok(existing.clone());
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let model = PredictionModel {
            id,
            player_id: p.player_id,
            match_id: p.match_id,
            home_goals: p.home_goals,
            away_goals: p.away_goals,
            penalty_winner_id: p.penalty_winner_id,
            score: None,
            created_at: now,
        };
        inner.predictions.insert(id, model.clone());

        debug!(
            player_id = p.player_id,
            match_id = p.match_id,
            "Prediction created in memory"
        );
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_prediction(
        &self,
        player_id: i64,
        match_id: i64,
    ) -> Result<Option<PredictionModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .predictions
            .values()
            .find(|row| row.player_id == player_id && row.match_id == match_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_by_match(&self, match_id: i64) -> Result<Vec<PredictionModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<PredictionModel> = inner
            .predictions
            .values()
            .filter(|row| row.match_id == match_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn set_score(&self, prediction_id: i64, score: i32) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner.predictions.get_mut(&prediction_id).ok_or_else(|| {
            warn!(prediction_id, "Prediction not found for scoring in memory");
            AppError::NotFound("Prediction not found".to_string())
        })?;

        row.score = Some(score);
        Ok(())
    }

    #[instrument(skip(self, match_ids))]
    async fn count_for_matches(
        &self,
        player_id: i64,
        match_ids: &[i64],
    ) -> Result<i64, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .predictions
            .values()
            .filter(|row| row.player_id == player_id && match_ids.contains(&row.match_id))
            .count() as i64)
    }

    #[instrument(skip(self))]
    async fn delete_by_match(&self, match_id: i64) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.predictions.len();
        inner.predictions.retain(|_, row| row.match_id != match_id);
        Ok((before - inner.predictions.len()) as u64)
    }
}

/// PostgreSQL implementation of prediction repository
pub struct PostgresPredictionRepository {
    pool: PgPool,
}

impl PostgresPredictionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn prediction_from_row(row: &sqlx::postgres::PgRow) -> PredictionModel {
    PredictionModel {
        id: row.get("id"),
        player_id: row.get("player_id"),
        match_id: row.get("match_id"),
        home_goals: row.get("home_goals"),
        away_goals: row.get("away_goals"),
        penalty_winner_id: row.get("penalty_winner_id"),
        score: row.get("score"),
        created_at: row.get("created_at"),
    }
}

const PREDICTION_COLUMNS: &str =
    "id, player_id, match_id, home_goals, away_goals, penalty_winner_id, score, created_at";

#[async_trait]
impl PredictionRepository for PostgresPredictionRepository {
    #[instrument(skip(self, p))]
    async fn upsert_prediction(&self, p: &NewPrediction) -> Result<PredictionModel, AppError> {
        let row = sqlx::query(&format!(
            "INSERT INTO predictions (player_id, match_id, home_goals, away_goals, penalty_winner_id) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (player_id, match_id) DO UPDATE SET \
             home_goals = EXCLUDED.home_goals, \
             away_goals = EXCLUDED.away_goals, \
             penalty_winner_id = EXCLUDED.penalty_winner_id, \
             created_at = NOW() \
             RETURNING {PREDICTION_COLUMNS}"
        ))
        .bind(p.player_id)
        .bind(p.match_id)
        .bind(p.home_goals)
        .bind(p.away_goals)
        .bind(p.penalty_winner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = p.player_id, match_id = p.match_id, "Failed to upsert prediction");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(
            player_id = p.player_id,
            match_id = p.match_id,
            "Prediction upserted in database"
        );
        Ok(prediction_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn find_prediction(
        &self,
        player_id: i64,
        match_id: i64,
    ) -> Result<Option<PredictionModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE player_id = $1 AND match_id = $2"
        ))
        .bind(player_id)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(prediction_from_row))
    }

    #[instrument(skip(self))]
    async fn list_by_match(&self, match_id: i64) -> Result<Vec<PredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE match_id = $1 ORDER BY id ASC"
        ))
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.iter().map(prediction_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn set_score(&self, prediction_id: i64, score: i32) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE predictions SET score = $2 WHERE id = $1")
            .bind(prediction_id)
            .bind(score)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!(prediction_id, "Prediction not found for scoring");
            return Err(AppError::NotFound("Prediction not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self, match_ids))]
    async fn count_for_matches(
        &self,
        player_id: i64,
        match_ids: &[i64],
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS prediction_count FROM predictions \
             WHERE player_id = $1 AND match_id = ANY($2)",
        )
        .bind(player_id)
        .bind(match_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.get("prediction_count"))
    }

    #[instrument(skip(self))]
    async fn delete_by_match(&self, match_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM predictions WHERE match_id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
