// src/fetch/mastodon.rs
//! HTTP client for the Mastodon-compatible public timeline endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::fetch::types::{Post, SourceClient, SourceFetchError};

// Per-call timeout is mandatory: without it one unresponsive instance
// would stall the whole regional aggregate.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct RawStatus {
    id: String,
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    account: RawAccount,
}

#[derive(Debug, Default, Deserialize)]
struct RawAccount {
    #[serde(default)]
    acct: String,
}

pub struct MastodonClient {
    http: reqwest::Client,
}

impl MastodonClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fedi-pulse/0.1 (+https://github.com/fedi-pulse)")
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { http }
    }

    fn posts_from_items(items: Vec<serde_json::Value>) -> Vec<Post> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            // Undecodable items are dropped; only an unparseable array is fatal.
            let Ok(raw) = serde_json::from_value::<RawStatus>(item) else {
                continue;
            };
            out.push(Post {
                id: raw.id,
                created_at: raw.created_at,
                content: raw.content,
                url: raw.url,
                author_handle: raw.account.acct,
                source_domain: String::new(),
            });
        }
        out
    }
}

impl Default for MastodonClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceClient for MastodonClient {
    async fn fetch(&self, domain: &str, limit: usize) -> Result<Vec<Post>, SourceFetchError> {
        let t0 = Instant::now();
        let url = format!("https://{domain}/api/v1/timelines/public?limit={limit}&local=true");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if !content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("application/json")
        {
            return Err(SourceFetchError::ContentType(content_type));
        }

        let items: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| SourceFetchError::Body(e.to_string()))?;
        let posts = Self::posts_from_items(items);

        histogram!("source_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("source_posts_total").increment(posts.len() as u64);
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "mastodon"
    }
}
