use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{StageModel, DEFAULT_STAGE_FLAGS};
use crate::shared::AppError;

/// Trait for stage repository operations
#[async_trait]
pub trait StageRepository {
    /// Looks up a stage by (uppercased name, league), creating it with
    /// default rule flags on first reference.
    async fn find_or_create(&self, league_id: i64, name: &str) -> Result<StageModel, AppError>;
    async fn get_stage(&self, stage_id: i64) -> Result<Option<StageModel>, AppError>;
    /// Administrative override of the rule flags
    async fn set_flags(
        &self,
        stage_id: i64,
        allows_draw: bool,
        has_penalties: bool,
        is_two_legged: bool,
    ) -> Result<(), AppError>;
}

/// In-memory implementation of StageRepository for development and testing
pub struct InMemoryStageRepository {
    inner: Mutex<Inner>,
}

struct Inner {
    stages: HashMap<i64, StageModel>,
    next_id: i64,
}

impl Default for InMemoryStageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStageRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                stages: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn stage_count(&self) -> usize {
        self.inner.lock().unwrap().stages.len()
    }
}

#[async_trait]
impl StageRepository for InMemoryStageRepository {
    #[instrument(skip(self))]
    async fn find_or_create(&self, league_id: i64, name: &str) -> Result<StageModel, AppError> {
        let name = name.to_uppercase();
        let mut inner = self.inner.lock().unwrap();

        if let Some(existing) = inner
            .stages
            .values()
            .find(|s| s.league_id == league_id && s.name == name)
        {
            return Ok(existing.clone());
        }

        let (allows_draw, has_penalties, is_two_legged) = DEFAULT_STAGE_FLAGS;
        let id = inner.next_id;
        inner.next_id += 1;
        let stage = StageModel {
            id,
            league_id,
            name: name.clone(),
            allows_draw,
            has_penalties,
            is_two_legged,
        };
        inner.stages.insert(id, stage.clone());

        debug!(stage_id = id, league_id, stage = %name, "Stage created in memory");
        Ok(stage)
    }

    #[instrument(skip(self))]
    async fn get_stage(&self, stage_id: i64) -> Result<Option<StageModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.stages.get(&stage_id).cloned())
    }

    #[instrument(skip(self))]
    async fn set_flags(
        &self,
        stage_id: i64,
        allows_draw: bool,
        has_penalties: bool,
        is_two_legged: bool,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let stage = inner.stages.get_mut(&stage_id).ok_or_else(|| {
            warn!(stage_id, "Stage not found for flag update in memory");
            AppError::NotFound("Stage not found".to_string())
        })?;

        stage.allows_draw = allows_draw;
        stage.has_penalties = has_penalties;
        stage.is_two_legged = is_two_legged;
        Ok(())
    }
}

/// PostgreSQL implementation of stage repository
pub struct PostgresStageRepository {
    pool: PgPool,
}

impl PostgresStageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn stage_from_row(row: &sqlx::postgres::PgRow) -> StageModel {
    StageModel {
        id: row.get("id"),
        league_id: row.get("league_id"),
        name: row.get("name"),
        allows_draw: row.get("allows_draw"),
        has_penalties: row.get("has_penalties"),
        is_two_legged: row.get("is_two_legged"),
    }
}

const STAGE_COLUMNS: &str = "id, league_id, name, allows_draw, has_penalties, is_two_legged";

#[async_trait]
impl StageRepository for PostgresStageRepository {
    #[instrument(skip(self))]
    async fn find_or_create(&self, league_id: i64, name: &str) -> Result<StageModel, AppError> {
        let name = name.to_uppercase();

        let existing = sqlx::query(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE name = $1 AND league_id = $2"
        ))
        .bind(&name)
        .bind(league_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if let Some(row) = existing {
            return Ok(stage_from_row(&row));
        }

        let (allows_draw, has_penalties, is_two_legged) = DEFAULT_STAGE_FLAGS;
        let row = sqlx::query(&format!(
            "INSERT INTO stages (league_id, name, allows_draw, has_penalties, is_two_legged) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name, league_id) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {STAGE_COLUMNS}"
        ))
        .bind(league_id)
        .bind(&name)
        .bind(allows_draw)
        .bind(has_penalties)
        .bind(is_two_legged)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, league_id, stage = %name, "Failed to create stage");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(league_id, stage = %name, "Stage created in database");
        Ok(stage_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn get_stage(&self, stage_id: i64) -> Result<Option<StageModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {STAGE_COLUMNS} FROM stages WHERE id = $1"))
            .bind(stage_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.as_ref().map(stage_from_row))
    }

    #[instrument(skip(self))]
    async fn set_flags(
        &self,
        stage_id: i64,
        allows_draw: bool,
        has_penalties: bool,
        is_two_legged: bool,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE stages SET allows_draw = $2, has_penalties = $3, is_two_legged = $4 WHERE id = $1",
        )
        .bind(stage_id)
        .bind(allows_draw)
        .bind(has_penalties)
        .bind(is_two_legged)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!(stage_id, "Stage not found for flag update");
            return Err(AppError::NotFound("Stage not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_stage_with_default_flags() {
        let repo = InMemoryStageRepository::new();
        let stage = repo.find_or_create(10, "regular_season").await.unwrap();

        assert_eq!(stage.name, "REGULAR_SEASON");
        assert!(stage.allows_draw);
        assert!(!stage.has_penalties);
        assert!(!stage.is_two_legged);
    }

    #[tokio::test]
    async fn one_row_per_name_and_league() {
        let repo = InMemoryStageRepository::new();
        let first = repo.find_or_create(10, "FINAL").await.unwrap();
        let again = repo.find_or_create(10, "final").await.unwrap();
        let other_league = repo.find_or_create(11, "FINAL").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other_league.id);
        assert_eq!(repo.stage_count(), 2);
    }

    #[tokio::test]
    async fn flag_override_persists() {
        let repo = InMemoryStageRepository::new();
        let stage = repo.find_or_create(10, "FINAL").await.unwrap();

        repo.set_flags(stage.id, true, true, false).await.unwrap();

        let updated = repo.get_stage(stage.id).await.unwrap().unwrap();
        assert!(updated.has_penalties);
        assert_eq!(
            updated.prediction_format(),
            crate::stage::models::PredictionFormat::DrawSinglePen
        );
    }

    #[tokio::test]
    async fn flag_override_missing_stage_is_not_found() {
        let repo = InMemoryStageRepository::new();
        let result = repo.set_flags(99, true, true, true).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
