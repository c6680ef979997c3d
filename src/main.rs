//! Relay server binary.
//!
//! Wires the yt-dlp runner, the optional catalog API client and the HTTP
//! layer together, then serves until Ctrl-C.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vidrelay::adapters::youtube_api::YouTubeDataApi;
use vidrelay::adapters::ytdlp::YtDlpRunner;
use vidrelay::{router, AppState, RelayConfig};

#[tokio::main]
async fn main() {
    let config = RelayConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. Adapters
    let runner = Arc::new(YtDlpRunner::new(
        config.tools.clone(),
        config.metadata_timeout,
    ));
    info!(tool = %config.tools.tool_path.display(), "using extraction tool");

    // 2. Application services
    let mut state = AppState::new(runner, &config);
    match &config.youtube_api_key {
        Some(key) => state = state.with_details(Arc::new(YouTubeDataApi::new(key.clone()))),
        None => warn!("YOUTUBE_API_KEY not set, /api/details disabled"),
    }

    // 3. HTTP layer
    let app = router(Arc::new(state), config.static_dir.as_deref());

    // 4. Start server
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .expect("Failed to bind TCP listener");
    info!(
        addr = %config.bind_address(),
        max_streams = config.max_concurrent_streams,
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
