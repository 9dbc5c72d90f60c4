use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::models::TeamModel;
use super::repository::TeamRepository;
use crate::shared::{AppError, AppState};

/// HTTP handler registering or updating a team registry entry
///
/// PUT /teams
/// Name and venue land in the registry consulted during ingestion and
/// prediction reads.
#[instrument(name = "upsert_team", skip(state, team))]
pub async fn upsert_team(
    State(state): State<AppState>,
    Json(team): Json<TeamModel>,
) -> Result<Json<TeamModel>, AppError> {
    state.team_repository.upsert_team(&team).await?;

    info!(team_id = team.id, name = %team.name, "Team registered");
    Ok(Json(team))
}

/// HTTP handler fetching one team registry entry
///
/// GET /teams/{team_id}
#[instrument(name = "get_team", skip(state))]
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamModel>, AppError> {
    let team = state
        .team_repository
        .get_team(team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    Ok(Json(team))
}
