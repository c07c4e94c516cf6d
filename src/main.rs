use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use todo_api::config::{self, StorageBackend};
use todo_api::routes;
use todo_api::state::AppState;

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "Todo API server - projects, todo lists and ordered tasks")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides TODO_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Storage backend: memory or postgres (overrides STORAGE_BACKEND)")]
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config singleton reads the environment
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(storage) = args.storage {
        config.storage.backend = storage;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.api.log_filter)),
        )
        .init();

    tracing::info!("Starting Todo API in {:?} mode", config.environment);
    if todo_api::is_production!() && config.storage.backend == StorageBackend::Memory {
        tracing::warn!("In-memory storage in production: all data is lost on restart");
    }

    let state = AppState::from_config(&config)
        .await
        .context("failed to initialise application state")?;
    let app = routes::app(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Todo API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
