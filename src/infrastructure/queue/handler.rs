use std::sync::Arc;
use tracing::instrument;

use crate::application::{QaService, RagService};
use crate::domain::{chunk_documents, TextSplitter};
use crate::infrastructure::queue::{AskJob, JobKind, JobResult, ProcessDocumentsJob};

pub const ASK_ERROR_PREFIX: &str = "Error loading index or retrieving answer";

/// Turns dequeued jobs into final results. Errors become `failed` results.
pub struct JobHandler {
    splitter: TextSplitter,
    rag: Arc<RagService>,
    qa: Arc<QaService>,
}

impl JobHandler {
    pub fn new(splitter: TextSplitter, rag: Arc<RagService>, qa: Arc<QaService>) -> Self {
        Self { splitter, rag, qa }
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id, documents = job.documents.len()))]
    pub async fn process_documents(&self, job: &ProcessDocumentsJob) -> JobResult {
        let chunks = chunk_documents(&job.documents, &self.splitter);

        match self.rag.rebuild_index(&chunks).await {
            Ok(indexed) => {
                let names: Vec<&str> = job
                    .documents
                    .iter()
                    .map(|d| d.document.name.as_str())
                    .collect();
                JobResult::completed(
                    job.job_id,
                    JobKind::ProcessDocuments,
                    serde_json::json!({
                        "message": "PDFs processed and index created!",
                        "documents": names,
                        "chunks_indexed": indexed,
                    }),
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "indexing failed");
                JobResult::failed(
                    job.job_id,
                    JobKind::ProcessDocuments,
                    format!("Error processing PDFs: {e}"),
                )
            }
        }
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn ask(&self, job: &AskJob) -> JobResult {
        match self.qa.answer(&job.question).await {
            Ok(answer) => match serde_json::to_value(&answer) {
                Ok(value) => JobResult::completed(job.job_id, JobKind::Ask, value),
                Err(e) => JobResult::failed(job.job_id, JobKind::Ask, e.to_string()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "question failed");
                JobResult::failed(job.job_id, JobKind::Ask, format!("{ASK_ERROR_PREFIX}: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{services::DEFAULT_TOP_K, DocumentService, UploadedPdf};
    use crate::infrastructure::queue::QueueJobStatus;
    use crate::infrastructure::InMemoryVectorStore;
    use crate::test_support::{EchoLlm, FakeExtractor, KeywordEmbedding};

    fn handler() -> (JobHandler, DocumentService) {
        let documents = DocumentService::new(Arc::new(FakeExtractor));
        let rag = Arc::new(RagService::new(
            Arc::new(KeywordEmbedding),
            Arc::new(InMemoryVectorStore::new()),
            DEFAULT_TOP_K,
        ));
        let qa = Arc::new(QaService::new(rag.clone(), Arc::new(EchoLlm)));
        (
            JobHandler::new(TextSplitter::new(20, 0).unwrap(), rag, qa),
            documents,
        )
    }

    #[tokio::test]
    async fn test_ask_before_processing_fails_with_index_error() {
        let (handler, _) = handler();
        let result = handler.ask(&AskJob::new("what do cats do?")).await;

        assert_eq!(result.status, QueueJobStatus::Failed);
        let error = result.error.unwrap();
        assert!(error.starts_with(ASK_ERROR_PREFIX), "{error}");
        assert!(error.contains("index not built"));
    }

    #[tokio::test]
    async fn test_process_then_ask() {
        let (handler, documents) = handler();
        let extracted = documents
            .extract(vec![UploadedPdf::new(
                "pets.pdf",
                b"cats purr\n\ndogs bark\x0cfish swim".to_vec(),
            )])
            .await
            .unwrap();

        let processed = handler
            .process_documents(&ProcessDocumentsJob::new(extracted))
            .await;
        assert_eq!(processed.status, QueueJobStatus::Completed);
        let summary = processed.result.unwrap();
        assert_eq!(summary["documents"][0], "pets.pdf");
        assert_eq!(summary["chunks_indexed"], 3);

        let asked = handler.ask(&AskJob::new("do fish swim")).await;
        assert_eq!(asked.status, QueueJobStatus::Completed);
        let answer = asked.result.unwrap();
        assert!(answer["answer"].as_str().unwrap().contains("fish swim"));
        assert_eq!(answer["sources"][0]["source"], "pets.pdf");
    }
}
