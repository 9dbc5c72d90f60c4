use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::{service::SyncService, types::SyncSummary};
use crate::shared::{AppError, AppState};

/// HTTP handler triggering a provider sync for every configured league
///
/// POST /sync
/// Always responds 200 with the per-league tally; provider failures are
/// entries in the report, not errors.
#[instrument(name = "run_sync", skip(state))]
pub async fn run_sync(State(state): State<AppState>) -> Result<Json<SyncSummary>, AppError> {
    info!(league_count = state.leagues.len(), "Sync triggered");

    let service = SyncService::from_state(&state);
    let summary = service.sync_leagues(&state.leagues).await;

    Ok(Json(summary))
}
