mod analysis_client;
mod config;
mod editor;
mod errors;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis_client::HttpAnalysisBackend;
use crate::config::Config;
use crate::editor::ResumeTextEditor;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize analysis service client
    let retry = config.retry_policy();
    let analysis = HttpAnalysisBackend::new(config.analysis_service_url.clone(), retry)?;
    info!(
        "Analysis client initialized ({}, up to {} attempts within {}s)",
        config.analysis_service_url,
        retry.max_attempts,
        retry.max_elapsed.as_secs()
    );

    // Heuristic heading-based section detection
    let editor = ResumeTextEditor::default();

    let state = AppState {
        analysis: Arc::new(analysis),
        editor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
