// src/fetch/types.rs
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One public post from a source instance. Immutable once fetched.
/// `id` is unique per source instance only, never globally.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>, // numeric ordering, timezone-safe
    pub content: String,           // raw HTML as delivered by the instance
    pub url: String,
    pub author_handle: String,
    /// Attached by the aggregator; not part of the raw instance payload.
    pub source_domain: String,
}

/// Why a single instance fetch failed. Recoverable by contract: the
/// aggregator absorbs these, a failed instance contributes nothing.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("unexpected content type {0:?}")]
    ContentType(Option<String>),
    #[error("malformed body: {0}")]
    Body(String),
}

#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch a bounded page of recent local public posts from one instance.
    async fn fetch(&self, domain: &str, limit: usize) -> Result<Vec<Post>, SourceFetchError>;
    fn name(&self) -> &'static str;
}
