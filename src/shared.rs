use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::matches::repository::MatchRepository;
use crate::prediction::repository::PredictionRepository;
use crate::round::repository::RoundRepository;
use crate::stage::repository::StageRepository;
use crate::sync::eligibility::PredictabilityRules;
use crate::sync::provider::FixtureProvider;
use crate::sync::types::LeagueRef;
use crate::team::repository::TeamRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub round_repository: Arc<dyn RoundRepository + Send + Sync>,
    pub match_repository: Arc<dyn MatchRepository + Send + Sync>,
    pub stage_repository: Arc<dyn StageRepository + Send + Sync>,
    pub team_repository: Arc<dyn TeamRepository + Send + Sync>,
    pub prediction_repository: Arc<dyn PredictionRepository + Send + Sync>,
    pub provider: Arc<dyn FixtureProvider>,
    pub rules: PredictabilityRules,
    pub leagues: Vec<LeagueRef>,
    /// How long before a match's kickoff its round's predictions close
    pub prediction_lead: chrono::Duration,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Prediction deadline passed: {0}")]
    DeadlineClosed(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::DeadlineClosed(msg) => (
                StatusCode::FORBIDDEN,
                format!("Prediction deadline passed: {}", msg),
            ),
            AppError::Provider(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Provider error: {}", msg))
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::matches::repository::InMemoryMatchRepository;
    use crate::prediction::repository::InMemoryPredictionRepository;
    use crate::round::repository::InMemoryRoundRepository;
    use crate::stage::repository::InMemoryStageRepository;
    use crate::sync::provider::StaticFixtureProvider;
    use crate::team::repository::InMemoryTeamRepository;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        round_repository: Option<Arc<dyn RoundRepository + Send + Sync>>,
        match_repository: Option<Arc<dyn MatchRepository + Send + Sync>>,
        stage_repository: Option<Arc<dyn StageRepository + Send + Sync>>,
        team_repository: Option<Arc<dyn TeamRepository + Send + Sync>>,
        prediction_repository: Option<Arc<dyn PredictionRepository + Send + Sync>>,
        provider: Option<Arc<dyn FixtureProvider>>,
        rules: PredictabilityRules,
        leagues: Vec<LeagueRef>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                round_repository: None,
                match_repository: None,
                stage_repository: None,
                team_repository: None,
                prediction_repository: None,
                provider: None,
                rules: PredictabilityRules::default(),
                leagues: Vec::new(),
            }
        }

        pub fn with_round_repository(
            mut self,
            repo: Arc<dyn RoundRepository + Send + Sync>,
        ) -> Self {
            self.round_repository = Some(repo);
            self
        }

        pub fn with_match_repository(
            mut self,
            repo: Arc<dyn MatchRepository + Send + Sync>,
        ) -> Self {
            self.match_repository = Some(repo);
            self
        }

        pub fn with_stage_repository(
            mut self,
            repo: Arc<dyn StageRepository + Send + Sync>,
        ) -> Self {
            self.stage_repository = Some(repo);
            self
        }

        pub fn with_team_repository(mut self, repo: Arc<dyn TeamRepository + Send + Sync>) -> Self {
            self.team_repository = Some(repo);
            self
        }

        pub fn with_prediction_repository(
            mut self,
            repo: Arc<dyn PredictionRepository + Send + Sync>,
        ) -> Self {
            self.prediction_repository = Some(repo);
            self
        }

        pub fn with_provider(mut self, provider: Arc<dyn FixtureProvider>) -> Self {
            self.provider = Some(provider);
            self
        }

        pub fn with_rules(mut self, rules: PredictabilityRules) -> Self {
            self.rules = rules;
            self
        }

        pub fn with_leagues(mut self, leagues: Vec<LeagueRef>) -> Self {
            self.leagues = leagues;
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                round_repository: self
                    .round_repository
                    .unwrap_or_else(|| Arc::new(InMemoryRoundRepository::new())),
                match_repository: self
                    .match_repository
                    .unwrap_or_else(|| Arc::new(InMemoryMatchRepository::new())),
                stage_repository: self
                    .stage_repository
                    .unwrap_or_else(|| Arc::new(InMemoryStageRepository::new())),
                team_repository: self
                    .team_repository
                    .unwrap_or_else(|| Arc::new(InMemoryTeamRepository::new())),
                prediction_repository: self
                    .prediction_repository
                    .unwrap_or_else(|| Arc::new(InMemoryPredictionRepository::new())),
                provider: self
                    .provider
                    .unwrap_or_else(|| Arc::new(StaticFixtureProvider::new())),
                rules: self.rules,
                leagues: self.leagues,
                prediction_lead: chrono::Duration::hours(2),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
