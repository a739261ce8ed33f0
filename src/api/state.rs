use std::sync::Arc;

use crate::api::queue::{JobProducer, RedisPool};
use crate::application::DocumentService;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub job_producer: JobProducer,
    pub document_service: Arc<DocumentService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        redis_pool: RedisPool,
        document_service: Arc<DocumentService>,
        config: AppConfig,
    ) -> Self {
        let config = Arc::new(config);
        let job_producer =
            JobProducer::new(redis_pool.clone(), config.config.worker.result_ttl_seconds);
        Self {
            redis_pool,
            job_producer,
            document_service,
            config,
        }
    }
}
