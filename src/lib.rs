// Library crate for the matchday prediction backend
// This file exposes the public API for the binary and integration tests

pub mod matches;
pub mod prediction;
pub mod round;
pub mod shared;
pub mod stage;
pub mod sync;
pub mod team;

// Re-export commonly used types for easier access
pub use matches::models::{MatchModel, MatchStatus};
pub use prediction::scoring::{outcome, score_prediction, Outcome, ScoreResult};
pub use round::{models::RoundModel, service::RoundService};
pub use shared::{AppError, AppState};
pub use sync::{
    eligibility::PredictabilityRules,
    provider::{FixtureProvider, HttpFixtureProvider, StaticFixtureProvider},
    service::SyncService,
    types::{LeagueRef, SyncSummary},
};
