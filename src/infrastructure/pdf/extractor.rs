use pdf_oxide::PdfDocument;

use crate::domain::{
    ports::{ExtractedText, TextExtractor},
    DomainError,
};

/// Page-by-page text extraction backed by `pdf_oxide`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<ExtractedText, DomainError> {
        let mut doc = PdfDocument::from_bytes(bytes.to_vec())
            .map_err(|e| DomainError::validation(format!("{name} could not be read as a PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| DomainError::validation(format!("{name} has no readable page tree: {e}")))?;

        let pages = (0..page_count)
            .map(|page| match doc.extract_text(page) {
                Ok(text) => text,
                Err(e) => {
                    // Unreadable pages contribute empty text.
                    tracing::warn!(name, page, error = %e, "skipping page without extractable text");
                    String::new()
                }
            })
            .collect();

        tracing::debug!(name, page_count, "extracted pdf text");
        Ok(ExtractedText::new(pages))
    }
}
