use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

/// Brute-force cosine search over chunks held in process memory.
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<(DocumentChunk, Embedding)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Vec<(DocumentChunk, Embedding)>>, DomainError> {
        self.chunks
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, Vec<(DocumentChunk, Embedding)>>, DomainError> {
        self.chunks
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(
        &self,
        chunk: &DocumentChunk,
        embedding: &Embedding,
    ) -> Result<(), DomainError> {
        let mut store = self.write()?;
        store.retain(|(c, _)| c.id != chunk.id);
        store.push((chunk.clone(), embedding.clone()));
        Ok(())
    }

    async fn upsert_batch(
        &self,
        items: &[(DocumentChunk, Embedding)],
    ) -> Result<(), DomainError> {
        let mut store = self.write()?;
        store.retain(|(c, _)| !items.iter().any(|(new, _)| new.id == c.id));
        store.extend(items.iter().cloned());
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self.read()?;

        let mut results: Vec<SearchResult> = store
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        self.write()?
            .retain(|(chunk, _)| chunk.document_id != document_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.write()?.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_search() {
        let store = InMemoryVectorStore::new();
        let doc_id = Uuid::new_v4();

        let near = DocumentChunk::new(doc_id, "near", 0);
        let far = DocumentChunk::new(doc_id, "far", 1);
        store
            .upsert_batch(&[
                (far, Embedding::new(vec![0.0, 1.0, 0.0])),
                (near, Embedding::new(vec![1.0, 0.1, 0.0])),
            ])
            .await
            .unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0]);
        let results = store.search(&query, 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "near");
        assert!(results[0].score > 0.9);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_chunk() {
        let store = InMemoryVectorStore::new();
        let chunk = DocumentChunk::new(Uuid::new_v4(), "v1", 0);

        store
            .upsert(&chunk, &Embedding::new(vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&chunk, &Embedding::new(vec![0.0, 1.0]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_document_and_clear() {
        let store = InMemoryVectorStore::new();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        let embedding = Embedding::new(vec![1.0, 0.0, 0.0]);

        store
            .upsert(&DocumentChunk::new(doc_a, "a", 0), &embedding)
            .await
            .unwrap();
        store
            .upsert(&DocumentChunk::new(doc_b, "b", 0), &embedding)
            .await
            .unwrap();

        store.delete_by_document(doc_a).await.unwrap();
        let results = store.search(&embedding, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.document_id, doc_b);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
