use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the predictions table
///
/// One row per (player, match); saves before the round deadline update in
/// place. Only the scoring engine writes the `score` field.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PredictionModel {
    pub id: i64,
    pub player_id: i64,
    pub match_id: i64,
    pub home_goals: i32,
    pub away_goals: i32,
    pub penalty_winner_id: Option<i64>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload for a player's guess
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub player_id: i64,
    pub match_id: i64,
    pub home_goals: i32,
    pub away_goals: i32,
    pub penalty_winner_id: Option<i64>,
}
