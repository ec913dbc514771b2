//! Batch alignment intake.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use quill_models::BatchEntry;

use crate::error::{ApiError, ApiResult};
use crate::handlers::not_blank;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequest {
    #[validate(length(min = 1, message = "jobs must not be empty"), nested)]
    pub jobs: Vec<BatchItem>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    #[validate(custom(function = "not_blank"))]
    pub source_ref: String,
    #[serde(default)]
    pub aux_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub accepted: usize,
}

/// Queue a list of alignment jobs.
///
/// Auxiliary texts given as URLs are resolved through the extraction
/// pipeline before anything is enqueued.
pub async fn submit_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BatchResponse>)> {
    let Json(request) = payload?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let entries = request
        .jobs
        .into_iter()
        .map(|item| BatchEntry::new(item.source_ref, item.aux_text))
        .collect();

    let accepted = state.orchestrator.submit_batch(entries).await?;
    Ok((StatusCode::ACCEPTED, Json(BatchResponse { accepted })))
}
