// src/classify.rs
//! Classifier adapter: provider abstraction behind the sentiment summarizer.
//!
//! The model is an opaque capability: text in, scored labels out. Every
//! failure mode collapses to `None` so a single bad item can only ever be
//! skipped, never fail a request.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

pub const ENV_TEST_MODE: &str = "SENTIMENT_TEST_MODE";
pub const ENV_API_TOKEN: &str = "SENTIMENT_API_TOKEN";
const CONFIG_PATH: &str = "config/classifier.json";

/// One scored label from the classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `text`. `None` means unavailable or failed; the caller
    /// skips the item rather than propagating an error.
    async fn classify(&self, text: &str) -> Option<Vec<LabelScore>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Loaded from `config/classifier.json`. Defaults to disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// "inference" is the only real provider for now.
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    /// "ENV" means: read from SENTIMENT_API_TOKEN.
    pub api_key: Option<String>,
}

/// Read config from disk. Unreadable or malformed config means disabled.
pub fn load_classifier_config() -> ClassifierConfig {
    match fs::read_to_string(Path::new(CONFIG_PATH)) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => ClassifierConfig::default(),
    }
}

/// Factory: build a classifier according to config and environment.
///
/// * `SENTIMENT_TEST_MODE=mock` returns a deterministic mock.
/// * `enabled=false` (or no usable provider) returns the disabled client.
/// * `provider="inference"` builds the HTTP inference client.
pub fn build_classifier(config: &ClassifierConfig) -> DynClassifier {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClassifier::positive());
    }

    if !config.enabled {
        return Arc::new(DisabledClassifier);
    }

    match (config.provider.as_deref(), config.endpoint.as_deref()) {
        (Some("inference"), Some(endpoint)) => {
            let api_key = match config.api_key.as_deref() {
                Some("ENV") | None => std::env::var(ENV_API_TOKEN).unwrap_or_default(),
                Some(key) => key.to_string(),
            };
            Arc::new(InferenceClassifier::new(endpoint, api_key))
        }
        _ => Arc::new(DisabledClassifier),
    }
}

/// Always `None`; used when classification is turned off. The pipeline
/// degrades to a zeroed tally alongside a fully valid timeline.
pub struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    async fn classify(&self, _text: &str) -> Option<Vec<LabelScore>> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic classifier for tests and local runs.
#[derive(Clone)]
pub struct MockClassifier {
    pub fixed: Vec<LabelScore>,
}

impl MockClassifier {
    pub fn new(fixed: Vec<LabelScore>) -> Self {
        Self { fixed }
    }

    pub fn positive() -> Self {
        Self::new(vec![
            LabelScore {
                label: "POSITIVE".to_string(),
                score: 0.98,
            },
            LabelScore {
                label: "NEGATIVE".to_string(),
                score: 0.02,
            },
        ])
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _text: &str) -> Option<Vec<LabelScore>> {
        Some(self.fixed.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// HTTP inference provider: POST {"inputs": text} to a configured endpoint.
pub struct InferenceClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl InferenceClassifier {
    pub fn new(endpoint: &str, api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fedi-pulse/0.1 (+https://github.com/fedi-pulse)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Classifier for InferenceClassifier {
    async fn classify(&self, text: &str) -> Option<Vec<LabelScore>> {
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }

        let mut req = self.http.post(&self.endpoint).json(&Req { inputs: text });
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, "classifier request failed");
                counter!("classify_errors_total").increment(1);
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "classifier returned error status");
            counter!("classify_errors_total").increment(1);
            return None;
        }

        let body: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, "classifier body decode failed");
                counter!("classify_errors_total").increment(1);
                return None;
            }
        };
        parse_label_scores(body)
    }

    fn provider_name(&self) -> &'static str {
        "inference"
    }
}

/// Inference endpoints answer either `[[{label, score}]]` (batched) or
/// `[{label, score}]` (flat); accept both.
fn parse_label_scores(body: serde_json::Value) -> Option<Vec<LabelScore>> {
    if let Ok(nested) = serde_json::from_value::<Vec<Vec<LabelScore>>>(body.clone()) {
        return nested.into_iter().next();
    }
    serde_json::from_value::<Vec<LabelScore>>(body).ok()
}
