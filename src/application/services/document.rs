use std::sync::Arc;
use tracing::instrument;

use crate::domain::{ports::TextExtractor, Document, DomainError, ExtractedDocument};

/// A file as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedPdf {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedPdf {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    fn has_pdf_extension(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Validates uploads and pulls their text out. Splitting happens in the worker.
pub struct DocumentService {
    extractor: Arc<dyn TextExtractor>,
}

impl DocumentService {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn extract(
        &self,
        uploads: Vec<UploadedPdf>,
    ) -> Result<Vec<ExtractedDocument>, DomainError> {
        if uploads.is_empty() {
            return Err(DomainError::validation("Please upload at least one PDF."));
        }

        for upload in &uploads {
            if !upload.has_pdf_extension() {
                return Err(DomainError::validation(format!(
                    "{} is not a PDF file",
                    upload.name
                )));
            }
            if upload.bytes.is_empty() {
                return Err(DomainError::validation(format!("{} is empty", upload.name)));
            }
        }

        let extractor = self.extractor.clone();
        let documents = tokio::task::spawn_blocking(move || {
            uploads
                .iter()
                .map(|upload| -> Result<ExtractedDocument, DomainError> {
                    let text = extractor.extract(&upload.name, &upload.bytes)?;
                    if text.is_blank() {
                        tracing::warn!(name = %upload.name, "no text found in document");
                    }
                    let document = Document::new(&upload.name)
                        .with_pages(text.page_count())
                        .with_metadata(serde_json::json!({ "size_bytes": upload.bytes.len() }));
                    Ok(ExtractedDocument {
                        document,
                        text: text.joined(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| DomainError::internal(format!("extraction task failed: {e}")))??;

        if documents.iter().all(|d| d.text.trim().is_empty()) {
            return Err(DomainError::validation(
                "No extractable text found in the uploaded PDFs.",
            ));
        }

        Ok(documents)
    }
}
