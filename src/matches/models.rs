use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle state of a fixture
///
/// A closed vocabulary; provider strings are mapped in at the ingestion
/// boundary and never stored raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
    Cancelled,
}

impl MatchStatus {
    /// Maps the provider's raw status vocabulary. Unknown strings fall back
    /// to upcoming; cancellation only ever comes from an admin action.
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "SCHEDULED" => MatchStatus::Upcoming,
            "FINISHED" => MatchStatus::Finished,
            "IN_PLAY" => MatchStatus::Live,
            _ => MatchStatus::Upcoming,
        }
    }
}

/// Database model for the matches table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchModel {
    pub id: i64,
    pub round_id: i64,
    pub league_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub kickoff: DateTime<Utc>,
    pub stage_id: i64,
    pub matchday: i32,
    pub external_id: Option<i64>, // provider match id; absent for manual entries
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub penalty_winner_id: Option<i64>,
    pub is_predictable: bool,
    pub venue: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchModel {
    /// Both final goals recorded; scoring only runs past this point
    pub fn has_final_score(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }
}

/// Insert payload for a newly ingested or manually added match
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub round_id: i64,
    pub league_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub kickoff: DateTime<Utc>,
    pub stage_id: i64,
    pub matchday: i32,
    pub external_id: Option<i64>,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_predictable: bool,
    pub venue: String,
}

/// Partial update applied by admin operations; `None` leaves a field as-is
#[derive(Debug, Clone, Default)]
pub struct MatchChanges {
    pub status: Option<MatchStatus>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub penalty_winner_id: Option<i64>,
    pub venue: Option<String>,
    pub is_predictable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SCHEDULED", MatchStatus::Upcoming)]
    #[case("FINISHED", MatchStatus::Finished)]
    #[case("IN_PLAY", MatchStatus::Live)]
    #[case("TIMED", MatchStatus::Upcoming)]
    #[case("POSTPONED", MatchStatus::Upcoming)]
    #[case("", MatchStatus::Upcoming)]
    fn provider_status_mapping(#[case] raw: &str, #[case] expected: MatchStatus) {
        assert_eq!(MatchStatus::from_provider(raw), expected);
    }

    #[test]
    fn status_round_trips_through_its_label() {
        use std::str::FromStr;

        for status in [
            MatchStatus::Upcoming,
            MatchStatus::Live,
            MatchStatus::Finished,
            MatchStatus::Cancelled,
        ] {
            let label = status.to_string();
            assert_eq!(MatchStatus::from_str(&label).unwrap(), status);
        }
    }
}
