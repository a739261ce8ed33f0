use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::application::UploadedPdf;
use crate::domain::ExtractedDocument;
use crate::infrastructure::ProcessDocumentsJob;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub pages: usize,
    pub characters: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&ExtractedDocument> for DocumentResponse {
    fn from(extracted: &ExtractedDocument) -> Self {
        let doc = &extracted.document;
        Self {
            id: doc.id,
            name: doc.name.clone(),
            content_type: doc.content_type.clone(),
            pages: doc.pages,
            characters: extracted.text.chars().count(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: Uuid,
    pub status: String,
    pub documents: Vec<DocumentResponse>,
}

/// Accepts one or more PDF file parts, extracts their text and queues indexing.
///
/// Parts without a filename are ignored, so an empty file input on the form
/// still reaches the "no PDFs" validation.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        uploads.push(UploadedPdf::new(name, bytes.to_vec()));
    }

    let documents = state.document_service.extract(uploads).await?;
    let summaries = documents.iter().map(DocumentResponse::from).collect();

    let job = ProcessDocumentsJob::new(documents);
    let job_id = state.job_producer.push_documents_job(&job).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            job_id,
            status: "queued".to_string(),
            documents: summaries,
        }),
    ))
}
