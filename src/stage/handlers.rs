use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::models::{PredictionFormat, StageModel};
use super::repository::StageRepository;
use crate::shared::{AppError, AppState};

/// Request payload for the stage rule override
#[derive(Debug, Deserialize)]
pub struct StageFlagsRequest {
    pub allows_draw: bool,
    pub has_penalties: bool,
    pub is_two_legged: bool,
}

/// Response for stage mutations, with the entry format the flags imply
#[derive(Debug, Serialize, Deserialize)]
pub struct StageResponse {
    pub id: i64,
    pub league_id: i64,
    pub name: String,
    pub allows_draw: bool,
    pub has_penalties: bool,
    pub is_two_legged: bool,
    pub prediction_format: PredictionFormat,
}

impl From<StageModel> for StageResponse {
    fn from(stage: StageModel) -> Self {
        let prediction_format = stage.prediction_format();
        Self {
            id: stage.id,
            league_id: stage.league_id,
            name: stage.name,
            allows_draw: stage.allows_draw,
            has_penalties: stage.has_penalties,
            is_two_legged: stage.is_two_legged,
            prediction_format,
        }
    }
}

/// HTTP handler overriding a stage's rule flags
///
/// PATCH /stages/{stage_id}
/// Stages are created during ingestion with default flags; this is how an
/// admin turns on penalties or two-legged rules for a knockout stage.
#[instrument(name = "update_stage_flags", skip(state, request))]
pub async fn update_stage_flags(
    State(state): State<AppState>,
    Path(stage_id): Path<i64>,
    Json(request): Json<StageFlagsRequest>,
) -> Result<Json<StageResponse>, AppError> {
    state
        .stage_repository
        .set_flags(
            stage_id,
            request.allows_draw,
            request.has_penalties,
            request.is_two_legged,
        )
        .await?;

    let stage = state
        .stage_repository
        .get_stage(stage_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Stage not found".to_string()))?;

    info!(stage_id, format = %stage.prediction_format(), "Stage rules updated");
    Ok(Json(stage.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::stage::repository::InMemoryStageRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app(state: crate::shared::AppState) -> Router {
        Router::new()
            .route("/stages/:stage_id", axum::routing::patch(update_stage_flags))
            .with_state(state)
    }

    #[tokio::test]
    async fn flag_override_reports_the_new_format() {
        let stages = Arc::new(InMemoryStageRepository::new());
        let stage = stages.find_or_create(2001, "FINAL").await.unwrap();
        let state = AppStateBuilder::new()
            .with_stage_repository(stages)
            .build();

        let body = r#"{"allows_draw": true, "has_penalties": true, "is_two_legged": false}"#;
        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/stages/{}", stage.id))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let updated: StageResponse = serde_json::from_slice(&body).unwrap();
        assert!(updated.has_penalties);
        assert_eq!(updated.prediction_format, PredictionFormat::DrawSinglePen);
    }

    #[tokio::test]
    async fn missing_stage_is_404() {
        let body = r#"{"allows_draw": true, "has_penalties": false, "is_two_legged": false}"#;
        let request = Request::builder()
            .method("PATCH")
            .uri("/stages/7")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app(AppStateBuilder::new().build())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
