use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::SearchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<AnswerSource>,
}

/// A retrieved chunk that was stuffed into the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSource {
    pub document_id: Uuid,
    pub source: Option<String>,
    pub chunk_index: usize,
    pub score: f32,
}

impl From<&SearchResult> for AnswerSource {
    fn from(result: &SearchResult) -> Self {
        Self {
            document_id: result.chunk.document_id,
            source: result.chunk.metadata.source.clone(),
            chunk_index: result.chunk.chunk_index,
            score: result.score,
        }
    }
}
