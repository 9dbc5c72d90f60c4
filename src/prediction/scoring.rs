use crate::matches::models::MatchModel;

use super::models::PredictionModel;

pub const EXACT_SCORE_POINTS: i32 = 3;
pub const OUTCOME_POINTS: i32 = 1;
pub const PENALTY_BONUS: i32 = 1;

/// Result classification for a goal pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Away,
    Draw,
}

/// Maps a goal pair to its outcome; applied identically to actual and
/// predicted scores
pub fn outcome(home_goals: i32, away_goals: i32) -> Outcome {
    match home_goals.cmp(&away_goals) {
        std::cmp::Ordering::Greater => Outcome::Home,
        std::cmp::Ordering::Less => Outcome::Away,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Points awarded for a prediction, keeping "match not finished" distinct
/// from a scored zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreResult {
    NotScored,
    Points(i32),
}

impl ScoreResult {
    pub fn points(self) -> Option<i32> {
        match self {
            ScoreResult::NotScored => None,
            ScoreResult::Points(points) => Some(points),
        }
    }
}

/// Scores a stored prediction against a match's final result.
///
/// Exact score beats outcome; the penalty bonus stacks on top of either
/// when the stage plays shootouts and both the actual and the predicted
/// winner are recorded and agree.
pub fn score_prediction(
    m: &MatchModel,
    has_penalties: bool,
    prediction: &PredictionModel,
) -> ScoreResult {
    let (Some(actual_home), Some(actual_away)) = (m.home_score, m.away_score) else {
        return ScoreResult::NotScored;
    };

    let mut points = if actual_home == prediction.home_goals && actual_away == prediction.away_goals
    {
        EXACT_SCORE_POINTS
    } else if outcome(actual_home, actual_away)
        == outcome(prediction.home_goals, prediction.away_goals)
    {
        OUTCOME_POINTS
    } else {
        0
    };

    if has_penalties {
        if let (Some(actual_winner), Some(predicted_winner)) =
            (m.penalty_winner_id, prediction.penalty_winner_id)
        {
            if actual_winner == predicted_winner {
                points += PENALTY_BONUS;
            }
        }
    }

    ScoreResult::Points(points)
}
