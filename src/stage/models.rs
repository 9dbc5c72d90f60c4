use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::Display;

/// Database model for the stages table
///
/// One row per (name, league). The three flags drive how predictions for
/// the stage's matches are entered and scored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StageModel {
    pub id: i64,
    pub league_id: i64,
    pub name: String, // stored uppercased, e.g. "REGULAR_SEASON"
    pub allows_draw: bool,
    pub has_penalties: bool,
    pub is_two_legged: bool,
}

/// How a stage's rule flags classify its prediction entry format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionFormat {
    DrawSingle,
    DrawSinglePen,
    DrawTwoLegPen,
    /// Flag combination with no defined entry format
    Unrecognized,
}

impl StageModel {
    pub fn prediction_format(&self) -> PredictionFormat {
        match (self.allows_draw, self.has_penalties, self.is_two_legged) {
            (true, false, false) => PredictionFormat::DrawSingle,
            (true, true, false) => PredictionFormat::DrawSinglePen,
            (true, true, true) => PredictionFormat::DrawTwoLegPen,
            _ => PredictionFormat::Unrecognized,
        }
    }
}

/// Default flags for a stage created on first reference during ingestion
pub const DEFAULT_STAGE_FLAGS: (bool, bool, bool) = (true, false, false);
