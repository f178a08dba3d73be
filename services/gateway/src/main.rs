use gateway::{AppState, GatewayConfig, create_router};
use matchmaker::{InMemoryMatchStore, MatchStore, MatchmakingEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Matchmaking service");

    let config = GatewayConfig::from_env()?;
    let store: Arc<dyn MatchStore> = Arc::new(InMemoryMatchStore::new());
    let state = AppState::new(store, config.clone());

    let engine = MatchmakingEngine::start(
        Arc::clone(&state.store),
        Arc::clone(&state.notifier),
        config.engine.clone(),
    )?;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.stop().await?;
    tracing::info!("Matchmaking service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
