mod handler;
mod jobs;

pub use handler::{JobHandler, ASK_ERROR_PREFIX};
pub use jobs::{
    keys, queues, AskJob, JobKind, JobResult, ProcessDocumentsJob, QueueJobStatus,
};
