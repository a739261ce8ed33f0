use deadpool_redis::{redis::AsyncCommands, Config, Connection, Pool, Runtime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::info;

use pdf_chat::application::{PromptTemplate, QaService, RagService};
use pdf_chat::domain::TextSplitter;
use pdf_chat::infrastructure::{
    init_tracing, keys, queues, AppConfig, AskJob, JobHandler, JobKind, JobResult, OpenAiLlm,
    ProcessDocumentsJob, QdrantVectorStore, TextEmbedding,
};

pub type RedisPool = Pool;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

pub fn create_pool(redis_url: &str) -> Result<RedisPool> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

pub struct WorkerState {
    pub redis_pool: RedisPool,
    pub handler: JobHandler,
    pub result_ttl_seconds: u64,
}

impl WorkerState {
    pub async fn new(redis_pool: RedisPool, config: &AppConfig) -> anyhow::Result<Self> {
        let cfg = &config.config;

        let embedding = Arc::new(TextEmbedding::from_config(&cfg.embedding));
        let vector_store = Arc::new(
            QdrantVectorStore::new(&cfg.qdrant.url, &cfg.qdrant.collection, cfg.embedding.dimension)
                .await?,
        );
        let rag = Arc::new(RagService::new(embedding, vector_store, cfg.rag.top_k));

        let qa = QaService::new(rag.clone(), Arc::new(OpenAiLlm::from_config(&cfg.llm)))
            .with_template(PromptTemplate::new(&config.prompts.qa.template)?)
            .with_system_prompt(&config.prompts.qa.system)
            .with_timeout(Duration::from_secs(cfg.llm.timeout_seconds));

        let splitter = TextSplitter::new(cfg.splitter.chunk_size, cfg.splitter.chunk_overlap)?;

        Ok(Self {
            redis_pool,
            handler: JobHandler::new(splitter, rag, Arc::new(qa)),
            result_ttl_seconds: cfg.worker.result_ttl_seconds,
        })
    }
}

pub struct JobConsumer {
    state: Arc<WorkerState>,
    concurrency: usize,
    poll_interval: Duration,
}

impl JobConsumer {
    pub fn new(state: WorkerState, concurrency: usize, poll_interval: Duration) -> Self {
        Self {
            state: Arc::new(state),
            concurrency: concurrency.max(1),
            poll_interval,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        tracing::info!(concurrency = self.concurrency, "consumer started");

        loop {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::Processing(e.to_string()))?;
            let state = self.state.clone();

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = process_next_job(&state).await {
                    tracing::error!(error = %e, "job failed");
                }
            });

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

async fn conn(state: &WorkerState) -> Result<Connection> {
    state
        .redis_pool
        .get()
        .await
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

async fn set_status(state: &WorkerState, conn: &mut Connection, status: &JobResult) -> Result<()> {
    let json = serde_json::to_string(status)?;
    conn.set_ex::<_, _, ()>(
        keys::job_status(&status.job_id),
        &json,
        state.result_ttl_seconds,
    )
    .await
    .map_err(|e| WorkerError::Redis(e.to_string()))
}

async fn process_next_job(state: &WorkerState) -> Result<()> {
    let mut c = conn(state).await?;

    let result: Option<(String, String)> = c
        .brpop(&queues::ALL, 1.0)
        .await
        .map_err(|e| WorkerError::Redis(e.to_string()))?;

    if let Some((queue, job_json)) = result {
        match queue.as_str() {
            q if q == queues::DOCUMENTS_QUEUE => match serde_json::from_str(&job_json) {
                Ok(job) => process_documents_job(state, &mut c, job).await?,
                Err(e) => reject_job(state, &mut c, &job_json, JobKind::ProcessDocuments, e).await?,
            },
            q if q == queues::ASK_QUEUE => match serde_json::from_str(&job_json) {
                Ok(job) => process_ask_job(state, &mut c, job).await?,
                Err(e) => reject_job(state, &mut c, &job_json, JobKind::Ask, e).await?,
            },
            _ => tracing::warn!(queue, "unknown queue"),
        }
    }
    Ok(())
}

async fn reject_job(
    state: &WorkerState,
    c: &mut Connection,
    raw: &str,
    kind: JobKind,
    error: serde_json::Error,
) -> Result<()> {
    match JobResult::undecodable(raw, kind, &error) {
        Some(result) => {
            tracing::warn!(job_id = %result.job_id, error = %error, "rejecting malformed job");
            set_status(state, c, &result).await
        }
        None => Err(WorkerError::Serialization(error)),
    }
}

async fn process_documents_job(
    state: &WorkerState,
    c: &mut Connection,
    job: ProcessDocumentsJob,
) -> Result<()> {
    tracing::info!(job_id = %job.job_id, documents = job.documents.len(), "processing documents");
    set_status(state, c, &JobResult::processing(job.job_id, JobKind::ProcessDocuments)).await?;

    let result = state.handler.process_documents(&job).await;
    set_status(state, c, &result).await?;

    tracing::info!(job_id = %job.job_id, status = result.status.as_str(), "documents job finished");
    Ok(())
}

async fn process_ask_job(state: &WorkerState, c: &mut Connection, job: AskJob) -> Result<()> {
    tracing::info!(job_id = %job.job_id, "answering question");
    set_status(state, c, &JobResult::processing(job.job_id, JobKind::Ask)).await?;

    let result = state.handler.ask(&job).await;
    set_status(state, c, &result).await?;

    tracing::info!(job_id = %job.job_id, status = result.status.as_str(), "ask job finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing("worker=debug,pdf_chat=debug", config.config.logging.json);

    let redis_pool = create_pool(&config.config.redis_url)?;
    info!("Redis connected");

    let state = WorkerState::new(redis_pool, &config).await?;
    info!("Qdrant connected");

    let worker = &config.config.worker;
    let consumer = JobConsumer::new(
        state,
        worker.concurrency,
        Duration::from_millis(worker.poll_interval_ms),
    );

    info!(concurrency = worker.concurrency, "worker started");
    tokio::select! {
        result = consumer.start() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    Ok(())
}
