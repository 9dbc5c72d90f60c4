use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewRound, RoundModel};
use crate::shared::AppError;

/// Trait for round repository operations
#[async_trait]
pub trait RoundRepository {
    /// Inserts the round unless its (start, end) window already exists,
    /// returning whichever row ends up owning the window. Two concurrent
    /// creations of the same window must converge on a single row.
    async fn insert_or_fetch(&self, round: &NewRound) -> Result<RoundModel, AppError>;
    async fn find_by_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<RoundModel>, AppError>;
    async fn get_round(&self, round_id: i64) -> Result<Option<RoundModel>, AppError>;
    async fn find_containing(&self, date: NaiveDate) -> Result<Option<RoundModel>, AppError>;
    /// Earliest round whose prediction deadline is still in the future
    async fn next_open_round(&self, now: DateTime<Utc>) -> Result<Option<RoundModel>, AppError>;
    async fn max_round_number(&self) -> Result<i32, AppError>;
    async fn delete_round(&self, round_id: i64) -> Result<(), AppError>;
}

/// In-memory implementation of RoundRepository for development and testing
pub struct InMemoryRoundRepository {
    inner: Mutex<Inner>,
}

struct Inner {
    rounds: HashMap<i64, RoundModel>,
    next_id: i64,
}

impl Default for InMemoryRoundRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoundRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rounds: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn round_count(&self) -> usize {
        self.inner.lock().unwrap().rounds.len()
    }
}

#[async_trait]
impl RoundRepository for InMemoryRoundRepository {
    #[instrument(skip(self, round))]
    async fn insert_or_fetch(&self, round: &NewRound) -> Result<RoundModel, AppError> {
        let mut inner = self.inner.lock().unwrap();

        // Window check and insert happen under one lock, mirroring the
        // database's uniqueness constraint on (start_date, end_date).
        if let Some(existing) = inner
            .rounds
            .values()
            .find(|r| r.start_date == round.start_date && r.end_date == round.end_date)
        {
            debug!(round_id = existing.id, "Round window already exists");
            return Ok(existing.clone());
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let model = RoundModel {
            id,
            round_number: round.round_number,
            name: round.name.clone(),
            start_date: round.start_date,
            end_date: round.end_date,
            prediction_deadline: round.prediction_deadline,
        };
        inner.rounds.insert(id, model.clone());

        debug!(round_id = id, round_number = round.round_number, "Round created in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_by_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<RoundModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rounds
            .values()
            .find(|r| r.start_date == start && r.end_date == end)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn get_round(&self, round_id: i64) -> Result<Option<RoundModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rounds.get(&round_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_containing(&self, date: NaiveDate) -> Result<Option<RoundModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rounds.values().find(|r| r.contains(date)).cloned())
    }

    #[instrument(skip(self))]
    async fn next_open_round(&self, now: DateTime<Utc>) -> Result<Option<RoundModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rounds
            .values()
            .filter(|r| r.prediction_deadline > now)
            .min_by_key(|r| r.prediction_deadline)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn max_round_number(&self) -> Result<i32, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rounds
            .values()
            .map(|r| r.round_number)
            .max()
            .unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn delete_round(&self, round_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.rounds.remove(&round_id).is_none() {
            warn!(round_id, "Round not found for deletion in memory");
            return Err(AppError::NotFound("Round not found".to_string()));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of round repository
pub struct PostgresRoundRepository {
    pool: PgPool,
}

impl PostgresRoundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn round_from_row(row: &sqlx::postgres::PgRow) -> RoundModel {
    RoundModel {
        id: row.get("id"),
        round_number: row.get("round_number"),
        name: row.get("name"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        prediction_deadline: row.get("prediction_deadline"),
    }
}

const ROUND_COLUMNS: &str = "id, round_number, name, start_date, end_date, prediction_deadline";

#[async_trait]
impl RoundRepository for PostgresRoundRepository {
    #[instrument(skip(self, round))]
    async fn insert_or_fetch(&self, round: &NewRound) -> Result<RoundModel, AppError> {
        // Insert-ignore then re-select: the unique constraint on the window
        // resolves concurrent creations in the loser's favor.
        let inserted = sqlx::query(&format!(
            "INSERT INTO rounds (round_number, name, start_date, end_date, prediction_deadline) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (start_date, end_date) DO NOTHING \
             RETURNING {ROUND_COLUMNS}"
        ))
        .bind(round.round_number)
        .bind(&round.name)
        .bind(round.start_date)
        .bind(round.end_date)
        .bind(round.prediction_deadline)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert round");
            AppError::DatabaseError(e.to_string())
        })?;

        if let Some(row) = inserted {
            debug!(round_number = round.round_number, "Round created in database");
            return Ok(round_from_row(&row));
        }

        self.find_by_window(round.start_date, round.end_date)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError("Round vanished after conflicting insert".to_string())
            })
    }

    #[instrument(skip(self))]
    async fn find_by_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<RoundModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds WHERE start_date = $1 AND end_date = $2"
        ))
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(round_from_row))
    }

    #[instrument(skip(self))]
    async fn get_round(&self, round_id: i64) -> Result<Option<RoundModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE id = $1"))
            .bind(round_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(round_from_row))
    }

    #[instrument(skip(self))]
    async fn find_containing(&self, date: NaiveDate) -> Result<Option<RoundModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds WHERE $1 BETWEEN start_date AND end_date"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(round_from_row))
    }

    #[instrument(skip(self))]
    async fn next_open_round(&self, now: DateTime<Utc>) -> Result<Option<RoundModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds WHERE prediction_deadline > $1 \
             ORDER BY prediction_deadline ASC LIMIT 1"
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(round_from_row))
    }

    #[instrument(skip(self))]
    async fn max_round_number(&self) -> Result<i32, AppError> {
        let row = sqlx::query("SELECT COALESCE(MAX(round_number), 0) AS max_number FROM rounds")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.get("max_number"))
    }

    #[instrument(skip(self))]
    async fn delete_round(&self, round_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rounds WHERE id = $1")
            .bind(round_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, round_id, "Failed to delete round");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(round_id, "Round not found for deletion");
            return Err(AppError::NotFound("Round not found".to_string()));
        }

        Ok(())
    }
}
