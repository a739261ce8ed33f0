use axum::{extract::State, http::StatusCode, Json};
use deadpool_redis::redis::cmd;
use serde::Serialize;

use crate::api::state::AppState;
use crate::infrastructure::queues;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct QueueDepths {
    pub documents: usize,
    pub ask: usize,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub redis: String,
    pub queued: Option<QueueDepths>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let connected = match state.redis_pool.get().await {
        Ok(mut conn) => {
            let ping: Result<String, _> = cmd("PING").query_async(&mut *conn).await;
            ping.is_ok()
        }
        Err(_) => false,
    };

    if !connected {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready".into(),
                redis: "disconnected".into(),
                queued: None,
            }),
        ));
    }

    let producer = &state.job_producer;
    let queued = match (
        producer.queue_depth(queues::DOCUMENTS_QUEUE).await,
        producer.queue_depth(queues::ASK_QUEUE).await,
    ) {
        (Ok(documents), Ok(ask)) => Some(QueueDepths { documents, ask }),
        _ => None,
    };

    Ok(Json(ReadinessResponse {
        status: "ready".into(),
        redis: "connected".into(),
        queued,
    }))
}
