use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TextSplitter;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub pages: usize,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            pages: 0,
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A document paired with the full text pulled out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document: Document,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(document_id: Uuid, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            chunk_index,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the uploaded file the chunk came from.
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits a document's text into chunks tagged with the document name.
///
/// Each chunk is assigned a sequential index starting from 0.
pub fn chunk_document(document: &Document, text: &str, splitter: &TextSplitter) -> Vec<DocumentChunk> {
    splitter
        .split_text(text)
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            DocumentChunk::new(document.id, content, index).with_metadata(ChunkMetadata {
                source: Some(document.name.clone()),
            })
        })
        .collect()
}

/// Splits each document on its own, so no chunk spans two files.
pub fn chunk_documents(documents: &[ExtractedDocument], splitter: &TextSplitter) -> Vec<DocumentChunk> {
    documents
        .iter()
        .flat_map(|d| chunk_document(&d.document, &d.text, splitter))
        .collect()
}
