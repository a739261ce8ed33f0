//! Port fakes and fixtures shared by unit tests.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{
    ports::{EmbeddingService, ExtractedText, LlmService, TextExtractor, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};
use crate::infrastructure::InMemoryVectorStore;

/// Treats the bytes as UTF-8 text with pages separated by form feeds.
/// Input starting with `%BROKEN` is rejected like an unreadable PDF.
pub struct FakeExtractor;

impl TextExtractor for FakeExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<ExtractedText, DomainError> {
        if bytes.starts_with(b"%BROKEN") {
            return Err(DomainError::validation(format!("{name} could not be read")));
        }
        let text = String::from_utf8_lossy(bytes);
        Ok(ExtractedText::new(
            text.split('\x0c').map(str::to_string).collect(),
        ))
    }
}

const VOCABULARY: [&str; 6] = ["cats", "purr", "dogs", "bark", "fish", "swim"];

/// Bag-of-words over a tiny fixed vocabulary; unknown words are ignored.
pub struct KeywordEmbedding;

impl KeywordEmbedding {
    fn vectorize(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; VOCABULARY.len()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if let Some(i) = VOCABULARY.iter().position(|v| *v == word) {
                vec[i] += 1.0;
            }
        }
        Embedding::new(vec)
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn model(&self) -> &str {
        "keyword"
    }
}

pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
        Err(DomainError::external("embedding service unavailable"))
    }

    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Err(DomainError::external("embedding service unavailable"))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Returns the prompt it was given, prefixed with `[system] ` when present.
pub struct EchoLlm;

#[async_trait]
impl LlmService for EchoLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        Ok(prompt.to_string())
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        Ok(format!("[{system}] {prompt}"))
    }

    fn model(&self) -> &str {
        "echo"
    }
}

pub struct SlowLlm;

#[async_trait]
impl LlmService for SlowLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".to_string())
    }

    async fn complete_with_system(
        &self,
        _system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.complete(prompt).await
    }

    fn model(&self) -> &str {
        "slow"
    }
}

/// In-memory store whose batch upserts take `delay`, leaving a window in which
/// the store has been cleared but not yet refilled.
pub struct SlowUpsertStore {
    inner: InMemoryVectorStore,
    delay: Duration,
}

impl SlowUpsertStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl VectorStore for SlowUpsertStore {
    async fn upsert(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError> {
        self.inner.upsert(chunk, embedding).await
    }

    async fn upsert_batch(&self, items: &[(DocumentChunk, Embedding)]) -> Result<(), DomainError> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert_batch(items).await
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        self.inner.search(query, top_k).await
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        self.inner.delete_by_document(document_id).await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.inner.clear().await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.inner.count().await
    }
}

/// A minimal uncompressed PDF with one page per entry, each drawing its text
/// in Helvetica. An empty entry produces a page with an empty content stream.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    // 1: catalog, 2: page tree, 3: font, then a page and its content per entry.
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}
