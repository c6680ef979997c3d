use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::sink;
use crate::application::resolver::CatalogResolver;
use crate::application::streamer::{StreamService, StreamSettings};
use crate::config::RelayConfig;
use crate::domain::{QualityRequest, RelayResult, VideoId};
use crate::ports::details::VideoDetailsSource;
use crate::ports::tool::ToolRunner;

/// Shared, read-only state behind every route.
pub struct AppState<T> {
    pub resolver: CatalogResolver<T>,
    pub streamer: Arc<StreamService<T>>,
    pub details: Option<Arc<dyn VideoDetailsSource>>,
}

impl<T: ToolRunner> AppState<T> {
    pub fn new(runner: Arc<T>, config: &RelayConfig) -> Self {
        Self {
            resolver: CatalogResolver::new(runner.clone()),
            streamer: Arc::new(StreamService::new(runner, StreamSettings::from(config))),
            details: None,
        }
    }

    pub fn with_details(mut self, source: Arc<dyn VideoDetailsSource>) -> Self {
        self.details = Some(source);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub format: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn formats<T: ToolRunner + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Path(video_id): Path<String>,
) -> RelayResult<Json<serde_json::Value>> {
    let video = VideoId::parse(&video_id)?;
    let info = state.resolver.resolve_catalog(&video).await?;
    Ok(Json(json!({ "success": true, "formats": info })))
}

async fn details(
    State(source): State<Arc<dyn VideoDetailsSource>>,
    Path(video_id): Path<String>,
) -> RelayResult<Json<serde_json::Value>> {
    let video = VideoId::parse(&video_id)?;
    let details = source.video_details(&video).await?;
    Ok(Json(json!({ "success": true, "details": details })))
}

async fn stream<T: ToolRunner + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Path(video_id): Path<String>,
    Query(params): Query<StreamParams>,
) -> RelayResult<Response> {
    let video = VideoId::parse(&video_id)?;
    let quality = QualityRequest::from_tokens(params.kind.as_deref(), params.format.as_deref())?;
    debug!(video = %video, ?quality, "stream requested");

    let (sink, pending) = sink::channel();
    let streamer = state.streamer.clone();
    let job = tokio::spawn(async move { streamer.stream(&video, quality, sink).await });
    pending.resolve(job).await
}

pub fn router<T: ToolRunner + 'static>(state: Arc<AppState<T>>, static_dir: Option<&FsPath>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let details_source = state.details.clone();
    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/formats/:video_id", get(formats::<T>))
        .route("/api/stream/:video_id", get(stream::<T>))
        .with_state(state);
    // only served when a catalog API key is configured
    if let Some(source) = details_source {
        app = app.merge(
            Router::new()
                .route("/api/details/:video_id", get(details))
                .with_state(source),
        );
    }

    if let Some(dir) = static_dir {
        // single-page app: unknown paths get index.html
        let spa = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}
