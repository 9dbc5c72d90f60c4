use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    service::PredictionService,
    types::{
        BatchPredictionRequest, BatchSaveResult, PredictionDetail, RescoreResponse,
        RoundPredictionStats,
    },
};
use crate::shared::{AppError, AppState};

/// HTTP handler saving a player's guesses for several matches at once
///
/// PUT /players/{player_id}/predictions
/// Incomplete entries are skipped; the response tallies what was stored.
#[instrument(name = "save_predictions", skip(state, request))]
pub async fn save_predictions(
    State(state): State<AppState>,
    Path(player_id): Path<i64>,
    Json(request): Json<BatchPredictionRequest>,
) -> Result<Json<BatchSaveResult>, AppError> {
    info!(
        player_id,
        entry_count = request.predictions.len(),
        "Saving predictions"
    );

    let service = PredictionService::from_state(&state);
    let result = service.save_batch(player_id, &request.predictions).await?;

    Ok(Json(result))
}

/// HTTP handler fetching one player's prediction for a match
///
/// GET /players/{player_id}/predictions/{match_id}
#[instrument(name = "get_prediction", skip(state))]
pub async fn get_prediction(
    State(state): State<AppState>,
    Path((player_id, match_id)): Path<(i64, i64)>,
) -> Result<Json<PredictionDetail>, AppError> {
    let service = PredictionService::from_state(&state);
    let detail = service.prediction_detail(player_id, match_id).await?;

    Ok(Json(detail))
}

/// HTTP handler for a player's predicted/unpredicted tally in a round
///
/// GET /players/{player_id}/rounds/{round_id}/stats
#[instrument(name = "round_prediction_stats", skip(state))]
pub async fn round_prediction_stats(
    State(state): State<AppState>,
    Path((player_id, round_id)): Path<(i64, i64)>,
) -> Result<Json<RoundPredictionStats>, AppError> {
    let service = PredictionService::from_state(&state);
    let stats = service.round_stats(player_id, round_id).await?;

    Ok(Json(stats))
}

/// HTTP handler recomputing scores for a finished match's predictions
///
/// POST /matches/{match_id}/rescore
/// Idempotent; re-running after a score correction rewrites every score.
#[instrument(name = "rescore_match", skip(state))]
pub async fn rescore_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
) -> Result<Json<RescoreResponse>, AppError> {
    let service = PredictionService::from_state(&state);
    let scored = service.update_scores_for_match(match_id).await?;

    info!(match_id, scored, "Rescore complete");
    Ok(Json(RescoreResponse { match_id, scored }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::repository::{tests::sample_match, InMemoryMatchRepository, MatchRepository};
    use crate::round::models::NewRound;
    use crate::round::repository::{InMemoryRoundRepository, RoundRepository};
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::{Duration, NaiveDate, Utc};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    async fn state_with_open_match() -> (crate::shared::AppState, i64) {
        let rounds = Arc::new(InMemoryRoundRepository::new());
        let matches = Arc::new(InMemoryMatchRepository::new());

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
        let m = matches
            .insert_match(&sample_match(81, 86, Utc::now() + Duration::hours(3)))
            .await
            .unwrap();

        let state = AppStateBuilder::new()
            .with_round_repository(rounds)
            .with_match_repository(matches)
            .build();
        (state, m.id)
    }

    fn app(state: crate::shared::AppState) -> Router {
        Router::new()
            .route(
                "/players/:player_id/predictions",
                axum::routing::put(save_predictions),
            )
            .route(
                "/players/:player_id/predictions/:match_id",
                axum::routing::get(get_prediction),
            )
            .route(
                "/players/:player_id/rounds/:round_id/stats",
                axum::routing::get(round_prediction_stats),
            )
            .with_state(state)
    }

    #[tokio::test]
    async fn batch_save_reports_saved_and_skipped() {
        let (state, match_id) = state_with_open_match().await;
        let app = app(state);

        let body = format!(
            r#"{{"predictions": [
                {{"match_id": {match_id}, "home_goals": 2, "away_goals": 1}},
                {{"match_id": {match_id}, "home_goals": null, "away_goals": 1}}
            ]}}"#
        );
        let request = Request::builder()
            .method("PUT")
            .uri("/players/1/predictions")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: BatchSaveResult = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.saved, 1);
        assert_eq!(result.skipped, 1);
    }

    #[tokio::test]
    async fn saved_prediction_reads_back_with_context() {
        let (state, match_id) = state_with_open_match().await;
        let app = app(state);

        let body = format!(
            r#"{{"predictions": [{{"match_id": {match_id}, "home_goals": 0, "away_goals": 0}}]}}"#
        );
        let request = Request::builder()
            .method("PUT")
            .uri("/players/7/predictions")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let request = Request::builder()
            .method("GET")
            .uri(format!("/players/7/predictions/{match_id}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let detail: PredictionDetail = serde_json::from_slice(&body).unwrap();
        assert_eq!(detail.player_id, 7);
        assert_eq!(detail.home_goals, 0);
        // No team registry entries in this state; names fall back to ids
        assert_eq!(detail.home_team, "Team 81");
    }

    #[tokio::test]
    async fn missing_prediction_is_404() {
        let (state, match_id) = state_with_open_match().await;
        let request = Request::builder()
            .method("GET")
            .uri(format!("/players/9/predictions/{match_id}"))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_reflect_saved_predictions() {
        let (state, match_id) = state_with_open_match().await;
        let app = app(state);

        let body = format!(
            r#"{{"predictions": [{{"match_id": {match_id}, "home_goals": 1, "away_goals": 0}}]}}"#
        );
        let request = Request::builder()
            .method("PUT")
            .uri("/players/1/predictions")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let request = Request::builder()
            .method("GET")
            .uri("/players/1/rounds/1/stats")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let stats: RoundPredictionStats = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.predicted, 1);
        assert_eq!(stats.unpredicted, 0);
    }
}
