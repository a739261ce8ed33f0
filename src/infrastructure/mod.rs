pub mod config;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod pdf;
pub mod queue;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use embedding::TextEmbedding;
pub use llm::OpenAiLlm;
pub use logging::init_tracing;
pub use pdf::PdfExtractor;
pub use queue::{
    keys, queues, AskJob, JobHandler, JobKind, JobResult, ProcessDocumentsJob, QueueJobStatus,
};
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
