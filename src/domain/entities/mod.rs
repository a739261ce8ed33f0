mod answer;
mod document;
mod embedding;

pub use answer::{Answer, AnswerSource};
pub use document::{
    chunk_document, chunk_documents, ChunkMetadata, Document, DocumentChunk, ExtractedDocument, SearchResult,
    PDF_CONTENT_TYPE,
};
pub use embedding::Embedding;
