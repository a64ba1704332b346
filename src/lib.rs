// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod pipeline;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::fetch::types::Post;
pub use crate::pipeline::TimelineResponse;
pub use crate::summary::{SentimentCounts, SentimentTally};

use std::sync::Arc;

use axum::Router;

/// Build the production router from env-provided configuration.
/// Same wiring as the binary entrypoint, minus the metrics recorder, so
/// end-to-end tests can drive it in-process.
pub async fn app() -> anyhow::Result<Router> {
    let regions = match config::RegionMap::load_default() {
        Ok(map) => Some(Arc::new(map)),
        Err(e) => {
            tracing::error!(error = ?e, "region configuration unavailable; timeline requests will fail");
            None
        }
    };

    let classifier_cfg = classify::load_classifier_config();
    let state = AppState {
        regions,
        sources: Arc::new(fetch::mastodon::MastodonClient::new()),
        cache: Arc::new(cache::MemoryStore::new()),
        classifier: classify::build_classifier(&classifier_cfg),
        cache_ttl: cache::ttl_from_env(),
    };

    Ok(api::create_router(state))
}
