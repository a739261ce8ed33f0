use pdf_chat::api::{create_router, queue, AppState};
use pdf_chat::application::DocumentService;
use pdf_chat::infrastructure::{init_tracing, AppConfig, PdfExtractor};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(
        "api=debug,pdf_chat=debug,tower_http=debug",
        config.config.logging.json,
    );

    let redis_pool = queue::create_pool(&config.config.redis_url)?;
    info!("Redis pool initialized");

    let document_service = Arc::new(DocumentService::new(Arc::new(PdfExtractor::new())));

    let addr = SocketAddr::new(
        config.config.server.host.parse()?,
        config.config.server.port,
    );

    let state = AppState::new(redis_pool, document_service, config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
