use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::PredictionModel;
use crate::matches::models::MatchStatus;

/// One guess inside a batch save; incomplete entries are skipped, not
/// rejected
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPredictionEntry {
    pub match_id: i64,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub penalty_winner_id: Option<i64>,
}

/// Request payload for saving a player's guesses for several matches
#[derive(Debug, Deserialize)]
pub struct BatchPredictionRequest {
    pub predictions: Vec<BatchPredictionEntry>,
}

/// Outcome of a batch save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSaveResult {
    pub saved: u32,
    pub skipped: u32,
}

impl BatchSaveResult {
    /// Whether at least one entry was stored
    pub fn any_saved(&self) -> bool {
        self.saved > 0
    }
}

/// A player's prediction joined with match and team context for display
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionDetail {
    pub prediction_id: i64,
    pub player_id: i64,
    pub match_id: i64,
    pub home_goals: i32,
    pub away_goals: i32,
    pub penalty_winner_id: Option<i64>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub round_id: i64,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl PredictionDetail {
    pub fn new(
        prediction: PredictionModel,
        m: &crate::matches::models::MatchModel,
        home_team: String,
        away_team: String,
    ) -> Self {
        Self {
            prediction_id: prediction.id,
            player_id: prediction.player_id,
            match_id: prediction.match_id,
            home_goals: prediction.home_goals,
            away_goals: prediction.away_goals,
            penalty_winner_id: prediction.penalty_winner_id,
            score: prediction.score,
            created_at: prediction.created_at,
            round_id: m.round_id,
            kickoff: m.kickoff,
            status: m.status,
            home_team,
            away_team,
            home_score: m.home_score,
            away_score: m.away_score,
        }
    }
}

/// Predicted-vs-unpredicted tally for one player and round
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundPredictionStats {
    pub round_id: i64,
    pub predicted: i64,
    pub unpredicted: i64,
}

/// Response for the rescore endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RescoreResponse {
    pub match_id: i64,
    pub scored: u32,
}
