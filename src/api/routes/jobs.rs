use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::infrastructure::{JobKind, JobResult};

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub status: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<JobResult> for JobStatusResponse {
    fn from(job: JobResult) -> Self {
        Self {
            job_id: job.job_id,
            kind: job.kind,
            status: job.status.as_str().to_string(),
            result: job.result,
            error: job.error,
            completed_at: job.completed_at,
        }
    }
}

pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    state
        .job_producer
        .get_job_status(&job_id)
        .await?
        .map(|job| Json(JobStatusResponse::from(job)))
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))
}
