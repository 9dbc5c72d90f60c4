use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{service::RoundService, types::RoundResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler fetching one round by id
///
/// GET /rounds/{round_id}
#[instrument(name = "get_round", skip(state))]
pub async fn get_round(
    State(state): State<AppState>,
    Path(round_id): Path<i64>,
) -> Result<Json<RoundResponse>, AppError> {
    let service = RoundService::new(Arc::clone(&state.round_repository), state.prediction_lead);
    let round = service.get_round(round_id).await?;

    Ok(Json(RoundResponse::from_model(round, Utc::now())))
}

/// HTTP handler for the earliest round still accepting predictions
///
/// GET /rounds/next
#[instrument(name = "next_open_round", skip(state))]
pub async fn next_open_round(
    State(state): State<AppState>,
) -> Result<Json<RoundResponse>, AppError> {
    let service = RoundService::new(Arc::clone(&state.round_repository), state.prediction_lead);
    let round = service
        .next_open_round()
        .await?
        .ok_or_else(|| AppError::NotFound("No open round".to_string()))?;

    info!(round_id = round.id, "Next open round resolved");
    Ok(Json(RoundResponse::from_model(round, Utc::now())))
}

#[derive(Debug, Deserialize)]
pub struct RoundLookupQuery {
    pub date: NaiveDate,
}

/// HTTP handler resolving the round whose window contains a date
///
/// GET /rounds?date=2025-07-14
#[instrument(name = "round_for_date", skip(state))]
pub async fn round_for_date(
    State(state): State<AppState>,
    Query(query): Query<RoundLookupQuery>,
) -> Result<Json<RoundResponse>, AppError> {
    let service = RoundService::new(Arc::clone(&state.round_repository), state.prediction_lead);
    let round = service
        .round_for_date(query.date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No round covers {}", query.date)))?;

    Ok(Json(RoundResponse::from_model(round, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::models::NewRound;
    use crate::round::repository::{InMemoryRoundRepository, RoundRepository};
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::{Duration, NaiveDate};
    use tower::ServiceExt; // for `oneshot`

    async fn seed_round(repo: &InMemoryRoundRepository, number: i32, deadline_offset_days: i64) {
        let start = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap()
            + Duration::days(7 * (number as i64 - 1));
        repo.insert_or_fetch(&NewRound {
            round_number: number,
            name: format!("Round {}", number),
            start_date: start,
            end_date: start + Duration::days(6),
            prediction_deadline: Utc::now() + Duration::days(deadline_offset_days),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn get_round_returns_round_json() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        seed_round(&repo, 1, 1).await;
        let app_state = AppStateBuilder::new().with_round_repository(repo).build();

        let app = Router::new()
            .route("/rounds/:round_id", axum::routing::get(get_round))
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds/1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let round: RoundResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(round.round_number, 1);
        assert!(round.open);
    }

    #[tokio::test]
    async fn get_round_missing_is_404() {
        let app_state = AppStateBuilder::new().build();
        let app = Router::new()
            .route("/rounds/:round_id", axum::routing::get(get_round))
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds/7")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn next_open_round_skips_closed_rounds() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        seed_round(&repo, 1, -1).await; // deadline already passed
        seed_round(&repo, 2, 3).await;
        let app_state = AppStateBuilder::new().with_round_repository(repo).build();

        let app = Router::new()
            .route("/rounds/next", axum::routing::get(next_open_round))
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds/next")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let round: RoundResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(round.round_number, 2);
    }

    #[tokio::test]
    async fn round_lookup_by_date_uses_window_membership() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        seed_round(&repo, 1, 1).await; // window 2025-07-11..17
        let app_state = AppStateBuilder::new().with_round_repository(repo).build();

        let app = Router::new()
            .route("/rounds", axum::routing::get(round_for_date))
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds?date=2025-07-14")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds?date=2025-07-18")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn next_open_round_empty_is_404() {
        let app_state = AppStateBuilder::new().build();
        let app = Router::new()
            .route("/rounds/next", axum::routing::get(next_open_round))
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/rounds/next")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
