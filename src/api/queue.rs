use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use uuid::Uuid;

use crate::infrastructure::{keys, queues, AskJob, JobKind, JobResult, ProcessDocumentsJob};

pub type RedisPool = Pool;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;

pub fn create_pool(redis_url: &str) -> Result<RedisPool> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| QueueError::Pool(e.to_string()))
}

#[derive(Clone)]
pub struct JobProducer {
    pool: RedisPool,
    result_ttl_seconds: u64,
}

impl JobProducer {
    pub fn new(pool: RedisPool, result_ttl_seconds: u64) -> Self {
        Self {
            pool,
            result_ttl_seconds,
        }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Pool(e.to_string()))
    }

    /// Records the pending status before pushing so a fast worker never
    /// overwrites a later status with `pending`.
    async fn push_job(&self, queue: &str, job_id: Uuid, kind: JobKind, payload: &str) -> Result<Uuid> {
        let mut conn = self.conn().await?;

        let status = serde_json::to_string(&JobResult::pending(job_id, kind))?;
        conn.set_ex::<_, _, ()>(keys::job_status(&job_id), &status, self.result_ttl_seconds)
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        conn.lpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        tracing::info!(job_id = %job_id, queue, "job queued");
        Ok(job_id)
    }

    pub async fn push_documents_job(&self, job: &ProcessDocumentsJob) -> Result<Uuid> {
        self.push_job(
            queues::DOCUMENTS_QUEUE,
            job.job_id,
            JobKind::ProcessDocuments,
            &serde_json::to_string(job)?,
        )
        .await
    }

    pub async fn push_ask_job(&self, job: &AskJob) -> Result<Uuid> {
        self.push_job(
            queues::ASK_QUEUE,
            job.job_id,
            JobKind::Ask,
            &serde_json::to_string(job)?,
        )
        .await
    }

    pub async fn get_job_status(&self, job_id: &Uuid) -> Result<Option<JobResult>> {
        let mut conn = self.conn().await?;
        let result: Option<String> = conn
            .get(keys::job_status(job_id))
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        result
            .map(|json| serde_json::from_str(&json).map_err(Into::into))
            .transpose()
    }

    pub async fn queue_depth(&self, queue: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        conn.llen(queue)
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))
    }
}
