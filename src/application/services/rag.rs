use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

pub const DEFAULT_TOP_K: usize = 4;

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
    /// Held for writing while the index is swapped, for reading while it is queried.
    index_lock: RwLock<()>,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k: default_top_k.max(1),
            index_lock: RwLock::new(()),
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    #[instrument(skip(self), fields(top_k = self.default_top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        self.vector_store.search(&embedding, top_k).await
    }

    /// Fails with `NotFound` until an index has been built.
    #[instrument(skip(self))]
    pub async fn ensure_ready(&self) -> Result<usize, DomainError> {
        let count = self.vector_store.count().await?;
        if count == 0 {
            return Err(DomainError::not_found(
                "index not built; process PDFs first",
            ));
        }
        Ok(count)
    }

    /// Checks the index and searches it without observing a rebuild half way.
    #[instrument(skip(self))]
    pub async fn ready_retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let _guard = self.index_lock.read().await;
        self.ensure_ready().await?;
        self.retrieve_top_k(query, top_k).await
    }

    async fn embed_chunks(
        &self,
        chunks: &[DocumentChunk],
    ) -> Result<Vec<(DocumentChunk, Embedding)>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        Ok(chunks.iter().cloned().zip(embeddings).collect())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, DomainError> {
        let items = self.embed_chunks(chunks).await?;
        if !items.is_empty() {
            self.vector_store.upsert_batch(&items).await?;
        }
        Ok(items.len())
    }

    /// Replaces the whole index with `chunks`.
    ///
    /// Embedding runs before the write lock is taken. The clear and upsert
    /// happen under it, so rebuilds are serialized and readers going through
    /// [`RagService::ready_retrieve`] see either the old index or the new one.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn rebuild_index(&self, chunks: &[DocumentChunk]) -> Result<usize, DomainError> {
        // A failed embedding call leaves the old index untouched.
        let items = self.embed_chunks(chunks).await?;

        let _guard = self.index_lock.write().await;
        self.vector_store.clear().await?;
        if !items.is_empty() {
            self.vector_store.upsert_batch(&items).await?;
        }

        tracing::info!(chunks = items.len(), "index rebuilt");
        Ok(items.len())
    }

    #[instrument(skip(self))]
    pub async fn delete_document(&self, document_id: uuid::Uuid) -> Result<(), DomainError> {
        self.vector_store.delete_by_document(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Document;
    use crate::infrastructure::InMemoryVectorStore;
    use crate::test_support::{FailingEmbedding, KeywordEmbedding, SlowUpsertStore};
    use std::time::Duration;

    fn chunks_for(doc: &Document, texts: &[&str]) -> Vec<DocumentChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk::new(doc.id, *t, i))
            .collect()
    }

    #[tokio::test]
    async fn test_ensure_ready_on_empty_index() {
        let rag = RagService::new(
            Arc::new(KeywordEmbedding),
            Arc::new(InMemoryVectorStore::new()),
            DEFAULT_TOP_K,
        );

        let err = rag.ensure_ready().await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_retrieve_ranks_matching_chunk_first() {
        let rag = RagService::new(
            Arc::new(KeywordEmbedding),
            Arc::new(InMemoryVectorStore::new()),
            DEFAULT_TOP_K,
        );
        let doc = Document::new("pets.pdf");
        rag.index_chunks(&chunks_for(&doc, &["cats purr", "dogs bark", "fish swim"]))
            .await
            .unwrap();

        let results = rag.retrieve("why do dogs bark").await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.content, "dogs bark");
        assert_eq!(rag.ensure_ready().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_index() {
        let store = Arc::new(InMemoryVectorStore::new());
        let rag = RagService::new(Arc::new(KeywordEmbedding), store.clone(), DEFAULT_TOP_K);

        let first = Document::new("old.pdf");
        rag.rebuild_index(&chunks_for(&first, &["cats purr", "dogs bark"]))
            .await
            .unwrap();

        let second = Document::new("new.pdf");
        let indexed = rag
            .rebuild_index(&chunks_for(&second, &["fish swim"]))
            .await
            .unwrap();

        assert_eq!(indexed, 1);
        assert_eq!(store.count().await.unwrap(), 1);
        let results = rag.retrieve("anything").await.unwrap();
        assert_eq!(results[0].chunk.document_id, second.id);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_old_index() {
        let store = Arc::new(InMemoryVectorStore::new());
        let doc = Document::new("keep.pdf");
        RagService::new(Arc::new(KeywordEmbedding), store.clone(), DEFAULT_TOP_K)
            .rebuild_index(&chunks_for(&doc, &["cats purr"]))
            .await
            .unwrap();

        let failing = RagService::new(Arc::new(FailingEmbedding), store.clone(), DEFAULT_TOP_K);
        let err = failing
            .rebuild_index(&chunks_for(&doc, &["dogs bark"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ExternalService(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_waits_for_rebuild_in_progress() {
        let store = Arc::new(SlowUpsertStore::new(Duration::from_millis(200)));
        let rag = Arc::new(RagService::new(
            Arc::new(KeywordEmbedding),
            store.clone(),
            DEFAULT_TOP_K,
        ));
        let old = Document::new("old.pdf");
        rag.rebuild_index(&chunks_for(&old, &["cats purr"])).await.unwrap();

        let new = Document::new("new.pdf");
        let rebuild = tokio::spawn({
            let rag = rag.clone();
            let chunks = chunks_for(&new, &["cats purr", "dogs bark"]);
            async move { rag.rebuild_index(&chunks).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let results = rag.ready_retrieve("cats", 4).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.chunk.document_id == new.id));
        assert_eq!(rebuild.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let store = Arc::new(InMemoryVectorStore::new());
        let rag = RagService::new(Arc::new(KeywordEmbedding), store.clone(), DEFAULT_TOP_K);
        let a = Document::new("a.pdf");
        let b = Document::new("b.pdf");
        rag.index_chunks(&chunks_for(&a, &["cats purr"])).await.unwrap();
        rag.index_chunks(&chunks_for(&b, &["dogs bark"])).await.unwrap();

        rag.delete_document(a.id).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }
}
