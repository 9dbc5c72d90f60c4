use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{MatchChanges, MatchModel, MatchStatus, NewMatch};
use crate::shared::AppError;

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository {
    async fn insert_match(&self, m: &NewMatch) -> Result<MatchModel, AppError>;
    /// Probe for the deduplication key: (home team, away team, kickoff).
    /// The external provider id is deliberately not part of the key.
    async fn find_duplicate(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        kickoff: DateTime<Utc>,
    ) -> Result<Option<MatchModel>, AppError>;
    async fn get_match(&self, match_id: i64) -> Result<Option<MatchModel>, AppError>;
    async fn list_by_round(&self, round_id: i64) -> Result<Vec<MatchModel>, AppError>;
    async fn list_by_league(&self, league_id: i64) -> Result<Vec<MatchModel>, AppError>;
    /// Applies the given changes and touches `updated_at`
    async fn update_match(
        &self,
        match_id: i64,
        changes: &MatchChanges,
    ) -> Result<MatchModel, AppError>;
    async fn delete_match(&self, match_id: i64) -> Result<(), AppError>;
    async fn delete_by_round(&self, round_id: i64) -> Result<u64, AppError>;
    async fn delete_by_league(&self, league_id: i64) -> Result<u64, AppError>;
}

/// In-memory implementation of MatchRepository for development and testing
pub struct InMemoryMatchRepository {
    inner: Mutex<Inner>,
}

struct Inner {
    matches: HashMap<i64, MatchModel>,
    next_id: i64,
}

impl Default for InMemoryMatchRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                matches: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn match_count(&self) -> usize {
        self.inner.lock().unwrap().matches.len()
    }
}

fn apply_changes(m: &mut MatchModel, changes: &MatchChanges, now: DateTime<Utc>) {
    if let Some(status) = changes.status {
        m.status = status;
    }
    if let Some(home_score) = changes.home_score {
        m.home_score = Some(home_score);
    }
    if let Some(away_score) = changes.away_score {
        m.away_score = Some(away_score);
    }
    if let Some(penalty_winner_id) = changes.penalty_winner_id {
        m.penalty_winner_id = Some(penalty_winner_id);
    }
    if let Some(venue) = &changes.venue {
        m.venue = venue.clone();
    }
    if let Some(is_predictable) = changes.is_predictable {
        m.is_predictable = is_predictable;
    }
    m.updated_at = now;
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    #[instrument(skip(self, m))]
    async fn insert_match(&self, m: &NewMatch) -> Result<MatchModel, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let id = inner.next_id;
        inner.next_id += 1;

        let model = MatchModel {
            id,
            round_id: m.round_id,
            league_id: m.league_id,
            home_team_id: m.home_team_id,
            away_team_id: m.away_team_id,
            kickoff: m.kickoff,
            stage_id: m.stage_id,
            matchday: m.matchday,
            external_id: m.external_id,
            status: m.status,
            home_score: m.home_score,
            away_score: m.away_score,
            penalty_winner_id: None,
            is_predictable: m.is_predictable,
            venue: m.venue.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.matches.insert(id, model.clone());

        debug!(match_id = id, round_id = m.round_id, "Match created in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_duplicate(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        kickoff: DateTime<Utc>,
    ) -> Result<Option<MatchModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .matches
            .values()
            .find(|m| {
                m.home_team_id == home_team_id
                    && m.away_team_id == away_team_id
                    && m.kickoff == kickoff
            })
            .cloned())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: i64) -> Result<Option<MatchModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.matches.get(&match_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_by_round(&self, round_id: i64) -> Result<Vec<MatchModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<MatchModel> = inner
            .matches
            .values()
            .filter(|m| m.round_id == round_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.kickoff);
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn list_by_league(&self, league_id: i64) -> Result<Vec<MatchModel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<MatchModel> = inner
            .matches
            .values()
            .filter(|m| m.league_id == league_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.kickoff);
        Ok(matches)
    }

    #[instrument(skip(self, changes))]
    async fn update_match(
        &self,
        match_id: i64,
        changes: &MatchChanges,
    ) -> Result<MatchModel, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let m = inner.matches.get_mut(&match_id).ok_or_else(|| {
            warn!(match_id, "Match not found for update in memory");
            AppError::NotFound("Match not found".to_string())
        })?;

        apply_changes(m, changes, Utc::now());
        Ok(m.clone())
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.matches.remove(&match_id).is_none() {
            warn!(match_id, "Match not found for deletion in memory");
            return Err(AppError::NotFound("Match not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_round(&self, round_id: i64) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.matches.len();
        inner.matches.retain(|_, m| m.round_id != round_id);
        Ok((before - inner.matches.len()) as u64)
    }

    #[instrument(skip(self))]
    async fn delete_by_league(&self, league_id: i64) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.matches.len();
        inner.matches.retain(|_, m| m.league_id != league_id);
        Ok((before - inner.matches.len()) as u64)
    }
}

/// PostgreSQL implementation of match repository
pub struct PostgresMatchRepository {
    pool: PgPool,
}

impl PostgresMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "id, round_id, league_id, home_team_id, away_team_id, kickoff, \
    stage_id, matchday, external_id, status, home_score, away_score, penalty_winner_id, \
    is_predictable, venue, created_at, updated_at";

fn match_from_row(row: &sqlx::postgres::PgRow) -> Result<MatchModel, AppError> {
    let status_raw: String = row.get("status");
    let status = MatchStatus::from_str(&status_raw)
        .map_err(|_| AppError::DatabaseError(format!("Unknown match status: {status_raw}")))?;

    Ok(MatchModel {
        id: row.get("id"),
        round_id: row.get("round_id"),
        league_id: row.get("league_id"),
        home_team_id: row.get("home_team_id"),
        away_team_id: row.get("away_team_id"),
        kickoff: row.get("kickoff"),
        stage_id: row.get("stage_id"),
        matchday: row.get("matchday"),
        external_id: row.get("external_id"),
        status,
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        penalty_winner_id: row.get("penalty_winner_id"),
        is_predictable: row.get("is_predictable"),
        venue: row.get("venue"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl MatchRepository for PostgresMatchRepository {
    #[instrument(skip(self, m))]
    async fn insert_match(&self, m: &NewMatch) -> Result<MatchModel, AppError> {
        let row = sqlx::query(&format!(
            "INSERT INTO matches (round_id, league_id, home_team_id, away_team_id, kickoff, \
             stage_id, matchday, external_id, status, home_score, away_score, is_predictable, venue) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(m.round_id)
        .bind(m.league_id)
        .bind(m.home_team_id)
        .bind(m.away_team_id)
        .bind(m.kickoff)
        .bind(m.stage_id)
        .bind(m.matchday)
        .bind(m.external_id)
        .bind(m.status.to_string())
        .bind(m.home_score)
        .bind(m.away_score)
        .bind(m.is_predictable)
        .bind(&m.venue)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert match");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(round_id = m.round_id, "Match created in database");
        match_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_duplicate(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        kickoff: DateTime<Utc>,
    ) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches \
             WHERE home_team_id = $1 AND away_team_id = $2 AND kickoff = $3"
        ))
        .bind(home_team_id)
        .bind(away_team_id)
        .bind(kickoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.as_ref().map(match_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: i64) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.as_ref().map(match_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_by_round(&self, round_id: i64) -> Result<Vec<MatchModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE round_id = $1 ORDER BY kickoff ASC"
        ))
        .bind(round_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter().map(match_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_by_league(&self, league_id: i64) -> Result<Vec<MatchModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE league_id = $1 ORDER BY kickoff ASC"
        ))
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.iter().map(match_from_row).collect()
    }

    #[instrument(skip(self, changes))]
    async fn update_match(
        &self,
        match_id: i64,
        changes: &MatchChanges,
    ) -> Result<MatchModel, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE matches SET \
             status = COALESCE($2, status), \
             home_score = COALESCE($3, home_score), \
             away_score = COALESCE($4, away_score), \
             penalty_winner_id = COALESCE($5, penalty_winner_id), \
             venue = COALESCE($6, venue), \
             is_predictable = COALESCE($7, is_predictable), \
             updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(match_id)
        .bind(changes.status.map(|s| s.to_string()))
        .bind(changes.home_score)
        .bind(changes.away_score)
        .bind(changes.penalty_winner_id)
        .bind(&changes.venue)
        .bind(changes.is_predictable)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, match_id, "Failed to update match");
            AppError::DatabaseError(e.to_string())
        })?;

        match row {
            Some(row) => match_from_row(&row),
            None => {
                warn!(match_id, "Match not found for update");
                Err(AppError::NotFound("Match not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!(match_id, "Match not found for deletion");
            return Err(AppError::NotFound("Match not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_round(&self, round_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM matches WHERE round_id = $1")
            .bind(round_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_by_league(&self, league_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM matches WHERE league_id = $1")
            .bind(league_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
