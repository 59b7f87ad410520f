mod analyzer;
mod catalog;
mod chat;
mod config;
mod error;
mod models;
mod routes;
mod routine;
mod uploads;

use std::{net::SocketAddr, sync::Arc};

use routes::{router, AppState};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{catalog::Catalog, chat::OpenRouterClient, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::load();
    match &config.chat.api_key {
        Some(key) => tracing::info!("Using API key: {}...", key.chars().take(6).collect::<String>()),
        None => tracing::warn!("No API key configured"),
    }
    tracing::info!(model = %config.chat.model, strategy = ?config.chat.strategy, "Chat proxy configured");

    let catalog = Catalog::default();
    tracing::info!("Loaded {} catalog products", catalog.products().len());

    let port = config.port;
    let state = AppState {
        catalog: Arc::new(catalog),
        chat: Arc::new(OpenRouterClient::new(&config.chat)),
        config: Arc::new(config),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}
