// src/fetch/mod.rs
pub mod mastodon;
pub mod types;

use futures::future::join_all;
use metrics::counter;

use crate::fetch::types::{Post, SourceClient};

/// Page size requested from each instance.
pub const PAGE_LIMIT: usize = 20;
/// Maximum length of an aggregated timeline.
pub const MAX_TIMELINE_LEN: usize = 50;

/// Stable sort newest first, then cap the length. Stability keeps source
/// order for posts sharing a timestamp.
pub fn merge_sort_truncate(mut posts: Vec<Post>, max_len: usize) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(max_len);
    posts
}

/// Fetch all domains of a region concurrently and join the survivors.
///
/// Waits for every call to complete; no early cancellation on first
/// failure, partial results are valid results. A failed domain is logged,
/// counted, and contributes nothing. All domains failing yields an empty
/// timeline, not an error.
pub async fn aggregate_posts(
    client: &dyn SourceClient,
    domains: &[String],
    page_limit: usize,
    max_len: usize,
) -> Vec<Post> {
    let calls = domains.iter().map(|domain| async move {
        match client.fetch(domain, page_limit).await {
            Ok(mut posts) => {
                for post in posts.iter_mut() {
                    post.source_domain = domain.clone();
                }
                posts
            }
            Err(e) => {
                tracing::warn!(error = ?e, %domain, "source fetch failed");
                counter!("source_fetch_errors_total").increment(1);
                Vec::new()
            }
        }
    });

    let batches = join_all(calls).await;
    merge_sort_truncate(batches.into_iter().flatten().collect(), max_len)
}
