mod config;
mod errors;
mod layout;
mod render;
mod resume;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{StyleCatalog, StyleSheet};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
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

    info!("Starting résumé press API v{}", env!("CARGO_PKG_VERSION"));

    // Style sheets are loaded once and shared read-only by every request
    let mut styles = StyleCatalog::builtin();
    if let Some(path) = &config.style_sheet_path {
        let sheet = StyleSheet::from_json_file(path)
            .with_context(|| format!("STYLE_SHEET_PATH={} could not be loaded", path.display()))?;
        info!(label = %sheet.label, path = %path.display(), "custom style sheet loaded");
        styles = styles.with_sheet(sheet);
    }
    info!(
        styles = ?styles.labels(),
        page_size = ?config.page_size,
        max_input_chars = config.max_input_chars,
        verify_parity = config.verify_parity,
        "render pipeline configured"
    );

    // Build app state
    let state = AppState::new(config.clone(), styles);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
