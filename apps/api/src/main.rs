mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod session;
mod state;
mod uploads;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{CompletionClient, GeminiClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::uploads::store::UploadStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ticket Analysis API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::from_config(&config).context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize upload store
    let uploads = UploadStore::open(&config.upload_folder)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload folder {}",
                config.upload_folder.display()
            )
        })?;
    info!("Upload folder: {}", uploads.dir().display());

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        uploads,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
