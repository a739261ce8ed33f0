use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::queue::QueueError;
use crate::domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(DomainError::Validation(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(DomainError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Domain(DomainError::ExternalService(_)) => StatusCode::BAD_GATEWAY,
            Self::Domain(DomainError::Internal(_)) | Self::Queue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client errors carry their message; server errors are logged and masked.
    fn public_message(&self) -> String {
        match self {
            Self::Domain(DomainError::Validation(msg))
            | Self::Domain(DomainError::NotFound(msg))
            | Self::BadRequest(msg)
            | Self::NotFound(msg) => msg.clone(),
            other => other
                .status()
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
