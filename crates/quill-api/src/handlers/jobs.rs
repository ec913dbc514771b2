//! Submit and poll handlers shared by every compute kind.
//!
//! The kind comes from the router as an [`Extension`], so one set of
//! handlers serves `/api/transcription`, `/api/extraction` and
//! `/api/alignment`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use quill_models::{CacheKey, ComputeKind};
use quill_worker::{PollOutcome, SubmitOutcome};

use crate::error::{ApiError, ApiResult};
use crate::handlers::not_blank;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[validate(custom(function = "not_blank"))]
    pub source_ref: String,
    #[serde(default)]
    pub aux_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub key: String,
}

/// Body shared by submit and poll responses.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub status: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    fn new(status: impl Into<String>, key: &CacheKey) -> Self {
        Self {
            status: status.into(),
            key: key.to_string(),
            result: None,
            error: None,
        }
    }
}

/// Submit a source reference for computation.
///
/// 200 with the stored result on a cache hit, otherwise 202 with either
/// `started` or the status of the job already in flight.
pub async fn submit_job(
    State(state): State<AppState>,
    Extension(kind): Extension<ComputeKind>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let Json(request) = payload?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(format!("sourceRef is required: {}", e)))?;

    let pipeline = state.orchestrator.pipeline(kind);
    let outcome = pipeline
        .submit(&request.source_ref, request.aux_text)
        .await?;

    Ok(match outcome {
        SubmitOutcome::Cached { key, result } => {
            let mut body = JobResponse::new("cached", &key);
            body.result = Some(result);
            (StatusCode::OK, Json(body))
        }
        // The job runs detached; its handle is not needed here
        SubmitOutcome::Started { key, .. } => {
            (StatusCode::ACCEPTED, Json(JobResponse::new("started", &key)))
        }
        SubmitOutcome::InFlight { key, status } => (
            StatusCode::ACCEPTED,
            Json(JobResponse::new(status.as_str(), &key)),
        ),
    })
}

/// `GET /api/{kind}/status/{key}`
pub async fn job_status(
    State(state): State<AppState>,
    Extension(kind): Extension<ComputeKind>,
    Path(key): Path<String>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    poll(&state, kind, &key).await
}

/// `POST /api/{kind}/status` with `{ "key": ... }`
pub async fn job_status_by_body(
    State(state): State<AppState>,
    Extension(kind): Extension<ComputeKind>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let Json(request) = payload?;
    poll(&state, kind, &request.key).await
}

async fn poll(
    state: &AppState,
    kind: ComputeKind,
    raw_key: &str,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let key = CacheKey::parse(raw_key).map_err(|e| ApiError::bad_request(e.to_string()))?;

    match state.orchestrator.pipeline(kind).poll(&key).await? {
        PollOutcome::InFlight(record) => Ok((
            StatusCode::ACCEPTED,
            Json(JobResponse::new(record.status.as_str(), &key)),
        )),
        PollOutcome::Completed { key, result } => {
            let mut body = JobResponse::new("completed", &key);
            body.result = Some(result);
            Ok((StatusCode::OK, Json(body)))
        }
        PollOutcome::Failed { key, error } => {
            let mut body = JobResponse::new("error", &key);
            body.error = Some(error);
            Ok((StatusCode::OK, Json(body)))
        }
        PollOutcome::Unknown => Err(ApiError::not_found(format!(
            "no {} job or result for key {}",
            kind, key
        ))),
    }
}
