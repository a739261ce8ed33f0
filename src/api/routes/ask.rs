use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::DomainError;
use crate::infrastructure::AskJob;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub job_id: Uuid,
    pub status: String,
}

pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<(StatusCode, Json<AskResponse>), ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(DomainError::validation("question must not be empty").into());
    }

    let job_id = state.job_producer.push_ask_job(&AskJob::new(question)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AskResponse {
            job_id,
            status: "queued".to_string(),
        }),
    ))
}
