//! Summarizer behavior: length band, skip-on-failure, label selection,
//! and tally invariants.

use async_trait::async_trait;
use chrono::Utc;

use fedi_pulse::classify::{Classifier, DisabledClassifier, LabelScore, MockClassifier};
use fedi_pulse::fetch::types::Post;
use fedi_pulse::summary::{summarize, SentimentCounts};

fn post_with_content(content: &str) -> Post {
    Post {
        id: "1".to_string(),
        created_at: Utc::now(),
        content: content.to_string(),
        url: String::new(),
        author_handle: "x".to_string(),
        source_domain: "a.example".to_string(),
    }
}

/// Classifier that answers per call from a fixed script, in order.
struct SequenceClassifier {
    script: std::sync::Mutex<Vec<Option<Vec<LabelScore>>>>,
}

impl SequenceClassifier {
    fn new(script: Vec<Option<Vec<LabelScore>>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script),
        }
    }
}

#[async_trait]
impl Classifier for SequenceClassifier {
    async fn classify(&self, _text: &str) -> Option<Vec<LabelScore>> {
        let mut guard = self.script.lock().expect("script lock");
        if guard.is_empty() {
            None
        } else {
            guard.remove(0)
        }
    }

    fn provider_name(&self) -> &'static str {
        "sequence"
    }
}

fn scored(label: &str, score: f64) -> LabelScore {
    LabelScore {
        label: label.to_string(),
        score,
    }
}

#[tokio::test]
async fn empty_input_yields_all_zero_tally() {
    let tally = summarize(&MockClassifier::positive(), &[]).await;
    assert_eq!(tally.counts, SentimentCounts::default());
    assert_eq!(tally.total_analyzed, 0);
    assert_eq!(tally.percentages, SentimentCounts::default());
}

#[tokio::test]
async fn out_of_band_lengths_are_excluded() {
    let posts = vec![
        post_with_content("a"),                        // 1 char: too short
        post_with_content(&"x".repeat(600)),           // 600 chars: too long
        post_with_content(&"y".repeat(50)),            // in band
    ];
    let tally = summarize(&MockClassifier::positive(), &posts).await;
    assert_eq!(tally.total_analyzed, 1);
    assert_eq!(tally.counts.positive, 1);
    assert_eq!(tally.percentages.positive, 100);
}

#[tokio::test]
async fn band_boundaries_are_inclusive() {
    let posts = vec![
        post_with_content(&"a".repeat(10)),
        post_with_content(&"b".repeat(512)),
        post_with_content(&"c".repeat(9)),
        post_with_content(&"d".repeat(513)),
    ];
    let tally = summarize(&MockClassifier::positive(), &posts).await;
    assert_eq!(tally.total_analyzed, 2);
}

#[tokio::test]
async fn length_is_measured_after_markup_stripping() {
    // 40 chars of markup around a 3-char text: excluded.
    let posts = vec![post_with_content("<p><strong><em>abc</em></strong></p>")];
    let tally = summarize(&MockClassifier::positive(), &posts).await;
    assert_eq!(tally.total_analyzed, 0);
}

#[tokio::test]
async fn per_item_failure_is_a_skip_not_an_error() {
    let classifier = SequenceClassifier::new(vec![
        Some(vec![scored("POSITIVE", 0.9), scored("NEGATIVE", 0.1)]),
        None, // classifier failed for this item
        Some(vec![scored("NEGATIVE", 0.8), scored("POSITIVE", 0.2)]),
    ]);
    let posts = vec![
        post_with_content(&"a".repeat(30)),
        post_with_content(&"b".repeat(30)),
        post_with_content(&"c".repeat(30)),
    ];
    let tally = summarize(&classifier, &posts).await;
    assert_eq!(tally.total_analyzed, 2);
    assert_eq!(tally.counts.positive, 1);
    assert_eq!(tally.counts.negative, 1);
    assert_eq!(tally.counts.sum(), tally.total_analyzed);
}

#[tokio::test]
async fn unavailable_classifier_degrades_to_zero_tally() {
    let posts = vec![
        post_with_content(&"a".repeat(30)),
        post_with_content(&"b".repeat(30)),
    ];
    let tally = summarize(&DisabledClassifier, &posts).await;
    assert_eq!(tally.total_analyzed, 0);
    assert_eq!(tally.percentages, SentimentCounts::default());
}

#[tokio::test]
async fn top_scoring_label_wins_including_positional_aliases() {
    let classifier = SequenceClassifier::new(vec![
        // LABEL_0 (negative alias) outranks LABEL_1.
        Some(vec![scored("LABEL_0", 0.9), scored("LABEL_1", 0.1)]),
        // An unrecognized top label counts as neutral.
        Some(vec![scored("MIXED", 0.7), scored("POSITIVE", 0.3)]),
    ]);
    let posts = vec![
        post_with_content(&"a".repeat(30)),
        post_with_content(&"b".repeat(30)),
    ];
    let tally = summarize(&classifier, &posts).await;
    assert_eq!(tally.counts.negative, 1);
    assert_eq!(tally.counts.neutral, 1);
    assert_eq!(tally.counts.positive, 0);
}

#[tokio::test]
async fn percentages_sum_to_one_hundred_within_slack() {
    let classifier = SequenceClassifier::new(vec![
        Some(vec![scored("POSITIVE", 1.0)]),
        Some(vec![scored("NEGATIVE", 1.0)]),
        Some(vec![scored("NEUTRAL", 1.0)]),
        Some(vec![scored("NEUTRAL", 1.0)]),
        Some(vec![scored("NEUTRAL", 1.0)]),
        Some(vec![scored("NEUTRAL", 1.0)]),
    ]);
    let posts: Vec<Post> = (0..6).map(|_| post_with_content(&"z".repeat(30))).collect();
    let tally = summarize(&classifier, &posts).await;
    assert_eq!(tally.total_analyzed, 6);
    let sum = tally.percentages.sum();
    assert!((99..=101).contains(&sum), "sum was {sum}");
}
