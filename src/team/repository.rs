use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::instrument;

use super::models::TeamModel;
use crate::shared::AppError;

/// Trait for team registry operations
#[async_trait]
pub trait TeamRepository {
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError>;
    async fn upsert_team(&self, team: &TeamModel) -> Result<(), AppError>;
}

/// In-memory implementation of TeamRepository for development and testing
#[derive(Default)]
pub struct InMemoryTeamRepository {
    teams: Mutex<HashMap<i64, TeamModel>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the given teams
    pub fn with_teams(teams: Vec<TeamModel>) -> Self {
        let map = teams.into_iter().map(|t| (t.id, t)).collect();
        Self {
            teams: Mutex::new(map),
        }
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    #[instrument(skip(self))]
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError> {
        let teams = self.teams.lock().unwrap();
        Ok(teams.get(&team_id).cloned())
    }

    #[instrument(skip(self, team))]
    async fn upsert_team(&self, team: &TeamModel) -> Result<(), AppError> {
        let mut teams = self.teams.lock().unwrap();
        teams.insert(team.id, team.clone());
        Ok(())
    }
}

/// PostgreSQL implementation of team repository
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    #[instrument(skip(self))]
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError> {
        let row = sqlx::query("SELECT id, name, venue FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(|row| TeamModel {
            id: row.get("id"),
            name: row.get("name"),
            venue: row.get("venue"),
        }))
    }

    #[instrument(skip(self, team))]
    async fn upsert_team(&self, team: &TeamModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO teams (id, name, venue) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, venue = EXCLUDED.venue",
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.venue)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
