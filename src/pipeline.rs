// src/pipeline.rs
//! Per-request pipeline: cache probe -> resolve region -> fan-out fetch ->
//! merge -> summarize -> detached cache write -> respond.
//!
//! Region resolution is the only stage that can fail the request. Fetch and
//! classification failures degrade: a smaller timeline, a zeroed tally.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::cache::cache_key;
use crate::error::ApiError;
use crate::fetch::types::Post;
use crate::fetch::{self, MAX_TIMELINE_LEN, PAGE_LIMIT};
use crate::summary::{self, SentimentTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// The wire payload. Its serialized bytes double as the cache value, so a
/// HIT response is byte-identical to the MISS that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub timeline: Vec<Post>,
    #[serde(rename = "sentimentAnalysis")]
    pub sentiment_analysis: SentimentTally,
}

/// Run the pipeline for one request. Returns the response bytes and
/// whether they came from the cache.
pub async fn timeline_for_region(
    state: &AppState,
    region_raw: &str,
) -> Result<(Vec<u8>, CacheStatus), ApiError> {
    let region = region_raw.trim().to_ascii_uppercase();
    let key = cache_key(&region);

    if let Some(bytes) = state.cache.get(&key).await {
        counter!("timeline_cache_hits_total").increment(1);
        return Ok((bytes, CacheStatus::Hit));
    }
    counter!("timeline_cache_misses_total").increment(1);

    let regions = state.regions.as_deref().ok_or(ApiError::Configuration)?;
    let domains = regions.resolve(&region)?;

    let posts =
        fetch::aggregate_posts(state.sources.as_ref(), domains, PAGE_LIMIT, MAX_TIMELINE_LEN)
            .await;
    let tally = summary::summarize(state.classifier.as_ref(), &posts).await;

    let payload = TimelineResponse {
        timeline: posts,
        sentiment_analysis: tally,
    };
    let bytes = serde_json::to_vec(&payload).map_err(|e| ApiError::Internal(e.to_string()))?;

    // Write-back is detached from the response path: it runs (and fails)
    // on its own, and the in-flight response never waits for it.
    let cache = Arc::clone(&state.cache);
    let ttl = state.cache_ttl;
    let stored = bytes.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.put(&key, stored, ttl).await {
            tracing::warn!(error = ?e, "cache write failed");
        }
    });

    Ok((bytes, CacheStatus::Miss))
}
