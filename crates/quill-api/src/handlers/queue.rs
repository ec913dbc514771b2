//! Queue status handler.

use axum::extract::State;
use axum::Json;

use quill_worker::QueueStatus;

use crate::state::AppState;

/// Batch backlog and per-kind registry counts.
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.orchestrator.queue_status())
}
