use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::models::RoundModel;

/// Response for round queries
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundResponse {
    pub id: i64,
    pub round_number: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub prediction_deadline: DateTime<Utc>,
    pub open: bool,
}

impl RoundResponse {
    pub fn from_model(round: RoundModel, now: DateTime<Utc>) -> Self {
        let open = round.is_open(now);
        Self {
            id: round.id,
            round_number: round.round_number,
            name: round.name,
            start_date: round.start_date,
            end_date: round.end_date,
            prediction_deadline: round.prediction_deadline,
            open,
        }
    }
}
