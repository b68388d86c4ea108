use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use chat_service::config::ChatConfig;
use chat_service::conversation::{SessionStore, SystemClock};
use chat_service::services::providers::openai::{OpenAiChatProvider, OpenAiConfig};
use chat_service::services::providers::ChatProvider;
use chat_service::{build_router, AppState};
use service_core::error::AppError;
use service_core::observability::init_tracing;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = ChatConfig::load()?;

    init_tracing("chat-service", &config.common.log_level);

    let provider: Arc<dyn ChatProvider> = Arc::new(OpenAiChatProvider::new(OpenAiConfig {
        api_key: config.openai.api_key.clone(),
        model: config.openai.model.clone(),
    }));

    tracing::info!(model = %config.openai.model, "Initialized chat provider");

    let sessions = SessionStore::new(Arc::new(SystemClock));

    let state = AppState {
        config: config.clone(),
        sessions,
        provider,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        port = config.common.port,
        backend = %config.backend.base_url,
        "Chat service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
