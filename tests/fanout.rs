//! Fan-out aggregation behavior: partial failure, ordering, truncation,
//! and domain stamping.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use fedi_pulse::fetch::types::{Post, SourceClient, SourceFetchError};
use fedi_pulse::fetch::{aggregate_posts, MAX_TIMELINE_LEN, PAGE_LIMIT};

enum Outcome {
    Posts(Vec<Post>),
    Fail,
}

/// Source client scripted per domain; unknown domains fail.
struct ScriptedSource {
    outcomes: HashMap<String, Outcome>,
}

impl ScriptedSource {
    fn new(outcomes: Vec<(&str, Outcome)>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(d, o)| (d.to_string(), o))
                .collect(),
        }
    }
}

#[async_trait]
impl SourceClient for ScriptedSource {
    async fn fetch(&self, domain: &str, _limit: usize) -> Result<Vec<Post>, SourceFetchError> {
        match self.outcomes.get(domain) {
            Some(Outcome::Posts(posts)) => Ok(posts.clone()),
            Some(Outcome::Fail) => Err(SourceFetchError::Status(503)),
            None => Err(SourceFetchError::Status(404)),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn at(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).unwrap()
}

fn post(id: &str, created_at: DateTime<Utc>) -> Post {
    Post {
        id: id.to_string(),
        created_at,
        content: "<p>hello world from over here</p>".to_string(),
        url: format!("https://example/@x/{id}"),
        author_handle: "x".to_string(),
        source_domain: String::new(),
    }
}

fn domains(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn one_dead_instance_does_not_sink_the_batch() {
    let healthy: Vec<Post> = (0..20).map(|i| post(&i.to_string(), at(1_000 + i))).collect();
    let source = ScriptedSource::new(vec![
        ("a.example", Outcome::Posts(healthy)),
        ("b.example", Outcome::Fail),
    ]);

    let merged = aggregate_posts(
        &source,
        &domains(&["a.example", "b.example"]),
        PAGE_LIMIT,
        MAX_TIMELINE_LEN,
    )
    .await;

    assert_eq!(merged.len(), 20);
    assert!(merged.iter().all(|p| p.source_domain == "a.example"));
    assert!(merged
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn all_instances_failing_yields_empty_timeline_not_error() {
    let source = ScriptedSource::new(vec![
        ("a.example", Outcome::Fail),
        ("b.example", Outcome::Fail),
    ]);

    let merged = aggregate_posts(
        &source,
        &domains(&["a.example", "b.example"]),
        PAGE_LIMIT,
        MAX_TIMELINE_LEN,
    )
    .await;

    assert!(merged.is_empty());
}

#[tokio::test]
async fn merge_across_sources_is_sorted_and_capped_at_fifty() {
    let a: Vec<Post> = (0..40).map(|i| post(&format!("a{i}"), at(2 * i))).collect();
    let b: Vec<Post> = (0..40)
        .map(|i| post(&format!("b{i}"), at(2 * i + 1)))
        .collect();
    let source = ScriptedSource::new(vec![
        ("a.example", Outcome::Posts(a)),
        ("b.example", Outcome::Posts(b)),
    ]);

    let merged = aggregate_posts(
        &source,
        &domains(&["a.example", "b.example"]),
        PAGE_LIMIT,
        MAX_TIMELINE_LEN,
    )
    .await;

    assert_eq!(merged.len(), 50);
    // Newest overall is b39 at ts 79.
    assert_eq!(merged[0].id, "b39");
    assert!(merged
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
    // Posts interleave from both sources, each stamped with its origin.
    assert!(merged.iter().any(|p| p.source_domain == "a.example"));
    assert!(merged.iter().any(|p| p.source_domain == "b.example"));
}

#[tokio::test]
async fn posts_sharing_a_timestamp_keep_source_order() {
    let same = at(5_000);
    let source = ScriptedSource::new(vec![(
        "a.example",
        Outcome::Posts(vec![post("first", same), post("second", same)]),
    )]);

    let merged = aggregate_posts(&source, &domains(&["a.example"]), PAGE_LIMIT, MAX_TIMELINE_LEN)
        .await;

    let ids: Vec<_> = merged.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
}
