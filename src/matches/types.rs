use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{MatchChanges, MatchModel, MatchStatus};
use crate::stage::models::PredictionFormat;

/// Request payload for the admin match update endpoint; absent fields are
/// left untouched
#[derive(Debug, Default, Deserialize)]
pub struct MatchUpdateRequest {
    pub status: Option<MatchStatus>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub penalty_winner_id: Option<i64>,
    pub venue: Option<String>,
    pub is_predictable: Option<bool>,
}

impl From<MatchUpdateRequest> for MatchChanges {
    fn from(request: MatchUpdateRequest) -> Self {
        MatchChanges {
            status: request.status,
            home_score: request.home_score,
            away_score: request.away_score,
            penalty_winner_id: request.penalty_winner_id,
            venue: request.venue,
            is_predictable: request.is_predictable,
        }
    }
}

/// Response for match queries and mutations
///
/// Carries the stage's prediction entry format so clients know which
/// inputs a guess for this match takes.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub id: i64,
    pub round_id: i64,
    pub league_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub matchday: i32,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub penalty_winner_id: Option<i64>,
    pub is_predictable: bool,
    pub venue: String,
    pub prediction_format: PredictionFormat,
    pub updated_at: DateTime<Utc>,
}

impl MatchResponse {
    pub fn from_model(m: MatchModel, prediction_format: PredictionFormat) -> Self {
        Self {
            id: m.id,
            round_id: m.round_id,
            league_id: m.league_id,
            home_team_id: m.home_team_id,
            away_team_id: m.away_team_id,
            kickoff: m.kickoff,
            status: m.status,
            matchday: m.matchday,
            home_score: m.home_score,
            away_score: m.away_score,
            penalty_winner_id: m.penalty_winner_id,
            is_predictable: m.is_predictable,
            venue: m.venue,
            prediction_format,
            updated_at: m.updated_at,
        }
    }
}

/// Response for bulk delete endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub removed: u64,
}
