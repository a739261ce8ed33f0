use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ExtractedDocument;

pub mod queues {
    pub const DOCUMENTS_QUEUE: &str = "jobs:documents";
    pub const ASK_QUEUE: &str = "jobs:ask";

    /// Polled in this order, so document processing runs before questions.
    pub const ALL: [&str; 2] = [DOCUMENTS_QUEUE, ASK_QUEUE];
}

pub mod keys {
    use uuid::Uuid;

    pub fn job_status(job_id: &Uuid) -> String {
        format!("job:status:{}", job_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QueueJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ProcessDocuments,
    Ask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub status: QueueJobStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobResult {
    fn new(job_id: Uuid, kind: JobKind, status: QueueJobStatus) -> Self {
        Self {
            job_id,
            kind,
            status,
            result: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn pending(job_id: Uuid, kind: JobKind) -> Self {
        Self::new(job_id, kind, QueueJobStatus::Pending)
    }

    pub fn processing(job_id: Uuid, kind: JobKind) -> Self {
        Self::new(job_id, kind, QueueJobStatus::Processing)
    }

    pub fn completed(job_id: Uuid, kind: JobKind, result: serde_json::Value) -> Self {
        Self {
            result: Some(result),
            completed_at: Some(Utc::now()),
            ..Self::new(job_id, kind, QueueJobStatus::Completed)
        }
    }

    pub fn failed(job_id: Uuid, kind: JobKind, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
            ..Self::new(job_id, kind, QueueJobStatus::Failed)
        }
    }

    /// A `failed` result for a queued payload that does not decode, as long as
    /// its `job_id` can still be read. Without one there is no status to update.
    pub fn undecodable(raw: &str, kind: JobKind, error: &serde_json::Error) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let job_id: Uuid = value.get("job_id")?.as_str()?.parse().ok()?;
        Some(Self::failed(job_id, kind, format!("Invalid job payload: {error}")))
    }
}

/// Uploaded PDFs whose text has been extracted, waiting to be indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDocumentsJob {
    pub job_id: Uuid,
    pub documents: Vec<ExtractedDocument>,
}

impl ProcessDocumentsJob {
    pub fn new(documents: Vec<ExtractedDocument>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            documents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskJob {
    pub job_id: Uuid,
    pub question: String,
}

impl AskJob {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            question: question.into(),
        }
    }
}
