use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and register the pipeline series.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_all();

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time series registration (so they show up on /metrics before first use).
pub fn describe_all() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "timeline_cache_hits_total",
            "Timeline responses served from cache."
        );
        describe_counter!(
            "timeline_cache_misses_total",
            "Timeline requests that rebuilt the payload."
        );
        describe_counter!(
            "source_fetch_errors_total",
            "Instance fetches that failed and were absorbed."
        );
        describe_counter!("source_posts_total", "Posts parsed from instance responses.");
        describe_counter!("classify_errors_total", "Classifier calls that failed.");
        describe_counter!(
            "classify_skipped_total",
            "Posts excluded from the sentiment tally."
        );
        describe_histogram!("source_fetch_ms", "Instance fetch time in milliseconds.");
    });
}
