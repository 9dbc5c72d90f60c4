use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::{week_window, NewRound, RoundModel};
use super::repository::RoundRepository;
use crate::shared::AppError;

/// Service assigning kickoffs to weekly rounds and answering round queries
pub struct RoundService {
    repository: Arc<dyn RoundRepository + Send + Sync>,
    prediction_lead: Duration,
}

impl RoundService {
    pub fn new(repository: Arc<dyn RoundRepository + Send + Sync>, prediction_lead: Duration) -> Self {
        Self {
            repository,
            prediction_lead,
        }
    }

    /// Resolves the round owning the kickoff's Friday-to-Thursday window,
    /// creating it on first reference.
    ///
    /// The deadline of a freshly created round is the kickoff minus the
    /// configured lead; later kickoffs landing in the same window reuse the
    /// round as-is.
    #[instrument(skip(self))]
    pub async fn round_for_kickoff(&self, kickoff: DateTime<Utc>) -> Result<RoundModel, AppError> {
        let (start, end) = week_window(kickoff);

        if let Some(round) = self.repository.find_by_window(start, end).await? {
            debug!(round_id = round.id, "Kickoff falls into existing round");
            return Ok(round);
        }

        let round_number = self.repository.max_round_number().await? + 1;
        let round = NewRound {
            round_number,
            name: format!("Round {}", round_number),
            start_date: start,
            end_date: end,
            prediction_deadline: kickoff - self.prediction_lead,
        };

        let created = self.repository.insert_or_fetch(&round).await?;
        info!(
            round_id = created.id,
            round_number = created.round_number,
            start = %created.start_date,
            "Round created for new week window"
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_round(&self, round_id: i64) -> Result<RoundModel, AppError> {
        self.repository
            .get_round(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Round not found".to_string()))
    }

    /// Round whose window contains the given calendar date, if any
    #[instrument(skip(self))]
    pub async fn round_for_date(&self, date: NaiveDate) -> Result<Option<RoundModel>, AppError> {
        self.repository.find_containing(date).await
    }

    /// Earliest round still accepting predictions
    #[instrument(skip(self))]
    pub async fn next_open_round(&self) -> Result<Option<RoundModel>, AppError> {
        self.repository.next_open_round(Utc::now()).await
    }
}
