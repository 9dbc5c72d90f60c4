use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the rounds table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RoundModel {
    pub id: i64,
    pub round_number: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate, // inclusive, always start_date + 6 days
    pub prediction_deadline: DateTime<Utc>,
}

impl RoundModel {
    /// Whether the given calendar date falls inside this round's window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether predictions are still accepted at the given instant
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.prediction_deadline
    }
}

/// Insert payload for a round whose window may already exist
#[derive(Debug, Clone)]
pub struct NewRound {
    pub round_number: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub prediction_deadline: DateTime<Utc>,
}

/// Friday-to-Thursday window containing the given kickoff.
///
/// The window start is the most recent Friday on or before the kickoff's
/// calendar date; the end is the following Thursday (inclusive). Every
/// kickoff in the same span maps to the same window, which is what keys
/// round identity.
pub fn week_window(kickoff: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let date = kickoff.date_naive();
    let days_back = (date.weekday().num_days_from_monday() + 7
        - Weekday::Fri.num_days_from_monday())
        % 7;
    let start = date - Duration::days(days_back as i64);
    (start, start + Duration::days(6))
}
