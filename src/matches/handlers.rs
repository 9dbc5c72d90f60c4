use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::MatchService,
    types::{MatchResponse, MatchUpdateRequest, PurgeResponse},
};
use crate::prediction::service::PredictionService;
use crate::shared::{AppError, AppState};

fn match_service(state: &AppState) -> MatchService {
    MatchService::new(
        Arc::clone(&state.match_repository),
        Arc::clone(&state.prediction_repository),
        Arc::clone(&state.round_repository),
        Arc::clone(&state.stage_repository),
    )
}

/// HTTP handler fetching one match by id
///
/// GET /matches/{match_id}
#[instrument(name = "get_match", skip(state))]
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
) -> Result<Json<MatchResponse>, AppError> {
    let service = match_service(&state);
    let m = service.get_match(match_id).await?;
    let format = service.prediction_format(m.stage_id).await?;

    Ok(Json(MatchResponse::from_model(m, format)))
}

/// HTTP handler listing a round's matches in kickoff order
///
/// GET /rounds/{round_id}/matches
#[instrument(name = "list_round_matches", skip(state))]
pub async fn list_round_matches(
    State(state): State<AppState>,
    Path(round_id): Path<i64>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    let service = match_service(&state);

    let mut responses = Vec::new();
    for m in service.list_round_matches(round_id).await? {
        let format = service.prediction_format(m.stage_id).await?;
        responses.push(MatchResponse::from_model(m, format));
    }

    Ok(Json(responses))
}

/// HTTP handler for the admin match update
///
/// PATCH /matches/{match_id}
/// When the update lands a final score, stored predictions for the match
/// are rescored before responding.
#[instrument(name = "update_match", skip(state, request))]
pub async fn update_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Json(request): Json<MatchUpdateRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let service = match_service(&state);
    let updated = service.update_match(match_id, request.into()).await?;

    if updated.has_final_score() {
        let scoring = PredictionService::from_state(&state);
        let scored = scoring.update_scores_for_match(match_id).await?;
        info!(match_id, scored, "Predictions rescored after match update");
    }

    let format = service.prediction_format(updated.stage_id).await?;
    Ok(Json(MatchResponse::from_model(updated, format)))
}

/// HTTP handler deleting one match and its predictions
///
/// DELETE /matches/{match_id}
#[instrument(name = "delete_match", skip(state))]
pub async fn delete_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    match_service(&state).delete_match(match_id).await?;
    Ok(Json(serde_json::json!({ "deleted": match_id })))
}

/// HTTP handler removing a round with everything in it
///
/// DELETE /rounds/{round_id}
#[instrument(name = "purge_round", skip(state))]
pub async fn purge_round(
    State(state): State<AppState>,
    Path(round_id): Path<i64>,
) -> Result<Json<PurgeResponse>, AppError> {
    let removed = match_service(&state).purge_round(round_id).await?;
    Ok(Json(PurgeResponse { removed }))
}

/// HTTP handler removing every match of a league
///
/// DELETE /leagues/{league_id}/matches
#[instrument(name = "purge_league", skip(state))]
pub async fn purge_league(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
) -> Result<Json<PurgeResponse>, AppError> {
    let removed = match_service(&state).purge_league(league_id).await?;
    Ok(Json(PurgeResponse { removed }))
}
