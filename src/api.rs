// src/api.rs
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::cache::CacheStore;
use crate::classify::Classifier;
use crate::config::RegionMap;
use crate::error::ApiError;
use crate::fetch::types::SourceClient;
use crate::pipeline;

/// Injected capabilities for the pipeline. One orchestrator, parameterized
/// by source client, cache store, and classifier, instead of parallel
/// per-capability handler variants.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the region map was missing or unparseable at boot;
    /// every timeline request then answers 500 until it is corrected.
    pub regions: Option<Arc<RegionMap>>,
    pub sources: Arc<dyn SourceClient>,
    pub cache: Arc<dyn CacheStore>,
    pub classifier: Arc<dyn Classifier>,
    pub cache_ttl: Duration,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/timeline/{region}", get(timeline))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn timeline(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (bytes, status) = pipeline::timeline_for_region(&state, &region).await?;
    Ok((
        StatusCode::OK,
        [
            ("content-type", "application/json"),
            ("x-cache-status", status.as_str()),
        ],
        bytes,
    ))
}
