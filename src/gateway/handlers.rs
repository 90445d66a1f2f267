use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{BatchJob, JobStatus},
    storage::DeleteOutcome,
};

use super::{GatewayState, errors::GatewayError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            job_id: None,
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    pub url_file: String,
    pub file: String,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct AppendParams {
    pub url_file: String,
    pub url: String,
}

pub async fn welcome() -> Json<ApiResponse> {
    Json(ApiResponse::ok("Concurrent product price scraper"))
}

/// Starts a batch and answers before it completes; poll `/jobs/{id}` for progress.
pub async fn submit_batch(
    State(state): State<GatewayState>,
    Query(params): Query<SubmitParams>,
) -> Result<Json<ApiResponse>, GatewayError> {
    state.files.input_path(&params.url_file)?;
    state.files.output_path(&params.file)?;

    let jurisdiction = params
        .state
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| state.default_jurisdiction.to_string());

    let job = BatchJob {
        input_file: params.url_file.trim().to_string(),
        output_file: params.file.trim().to_string(),
        jurisdiction,
    };
    let job_id = state.orchestrator.submit(job);

    Ok(Json(ApiResponse {
        job_id: Some(job_id),
        ..ApiResponse::ok("Task Accepted")
    }))
}

pub async fn delete_output(
    State(state): State<GatewayState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<ApiResponse>, GatewayError> {
    let message = match state.files.delete_output(&params.file).await? {
        DeleteOutcome::Deleted => "File Deleted",
        DeleteOutcome::NotFound => "No File Found",
    };
    Ok(Json(ApiResponse::ok(message)))
}

pub async fn append_url(
    State(state): State<GatewayState>,
    Query(params): Query<AppendParams>,
) -> Result<Json<ApiResponse>, GatewayError> {
    let url = params.url.trim();
    // One URL per line: embedded line breaks would smuggle extra entries in.
    if url.is_empty() || url.contains(['\n', '\r']) {
        return Err(GatewayError::InvalidUrl(params.url));
    }
    state.files.append_url(&params.url_file, url).await?;
    Ok(Json(ApiResponse::ok("URL added to file")))
}

pub async fn list_jobs(State(state): State<GatewayState>) -> Json<Vec<JobStatus>> {
    Json(state.orchestrator.registry().list())
}

pub async fn job_status(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatus>, GatewayError> {
    state
        .orchestrator
        .registry()
        .get(id)
        .map(Json)
        .ok_or(GatewayError::JobNotFound(id))
}
