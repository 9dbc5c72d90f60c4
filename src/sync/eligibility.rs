use std::collections::HashSet;

/// Configuration deciding which matches accept player predictions.
///
/// A match qualifies when its league is the primary tracked competition,
/// or when either participant is in the always-tracked set. Evaluated once
/// at ingestion time; the stored flag can be overridden by an admin.
#[derive(Debug, Clone, Default)]
pub struct PredictabilityRules {
    pub primary_league_id: Option<i64>,
    pub tracked_team_ids: HashSet<i64>,
}

impl PredictabilityRules {
    pub fn new(primary_league_id: Option<i64>, tracked_team_ids: HashSet<i64>) -> Self {
        Self {
            primary_league_id,
            tracked_team_ids,
        }
    }

    pub fn is_predictable(&self, league_id: i64, home_team_id: i64, away_team_id: i64) -> bool {
        self.primary_league_id == Some(league_id)
            || self.tracked_team_ids.contains(&home_team_id)
            || self.tracked_team_ids.contains(&away_team_id)
    }
}
