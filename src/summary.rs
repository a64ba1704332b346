// src/summary.rs
//! Sentiment summarizer: clean each post's HTML, classify in-band texts,
//! aggregate label counts into whole-percent shares.
//!
//! Skips are not failures: texts outside the accepted length band and items
//! the classifier cannot score are simply excluded from `total_analyzed`.

use metrics::counter;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::fetch::types::Post;

/// Accepted cleaned-text length band, in chars, inclusive on both ends.
/// Shorter texts carry too little signal; longer ones exceed the
/// classifier's input window.
pub const MIN_CLASSIFY_CHARS: usize = 10;
pub const MAX_CLASSIFY_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentCounts {
    pub fn sum(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }
}

/// Invariants: `counts.sum() == total_analyzed`; percentages are whole
/// percents of `total_analyzed` (all zero when it is zero) summing to
/// 100 +/- rounding slack otherwise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTally {
    pub counts: SentimentCounts,
    pub total_analyzed: u32,
    pub percentages: SentimentCounts,
}

impl SentimentTally {
    pub fn from_counts(counts: SentimentCounts) -> Self {
        let total = counts.sum();
        let percentages = if total == 0 {
            SentimentCounts::default()
        } else {
            SentimentCounts {
                positive: whole_percent(counts.positive, total),
                negative: whole_percent(counts.negative, total),
                neutral: whole_percent(counts.neutral, total),
            }
        };
        Self {
            counts,
            total_analyzed: total,
            percentages,
        }
    }
}

fn whole_percent(part: u32, total: u32) -> u32 {
    ((f64::from(part) / f64::from(total)) * 100.0).round() as u32
}

/// Strip markup down to plain text: entity decode, tag removal,
/// whitespace collapse, trim.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Positive,
    Negative,
    Neutral,
}

/// Fixed mapping from classifier labels. LABEL_1/LABEL_0 are the positional
/// aliases some models emit instead of named labels; anything unrecognized
/// counts as neutral.
fn map_label(label: &str) -> Label {
    let up = label.to_ascii_uppercase();
    if up.contains("POSITIVE") || up == "LABEL_1" {
        Label::Positive
    } else if up.contains("NEGATIVE") || up == "LABEL_0" {
        Label::Negative
    } else {
        Label::Neutral
    }
}

/// Classify every in-band post and tally the results. Per-item classifier
/// failures are treated identically to out-of-band skips.
pub async fn summarize(classifier: &dyn Classifier, posts: &[Post]) -> SentimentTally {
    let mut counts = SentimentCounts::default();

    for post in posts {
        let text = clean_text(&post.content);
        let len = text.chars().count();
        if !(MIN_CLASSIFY_CHARS..=MAX_CLASSIFY_CHARS).contains(&len) {
            counter!("classify_skipped_total").increment(1);
            continue;
        }

        let Some(scores) = classifier.classify(&text).await else {
            tracing::debug!(post = %post.id, "classifier unavailable, item skipped");
            counter!("classify_skipped_total").increment(1);
            continue;
        };
        let Some(top) = scores.iter().max_by(|a, b| a.score.total_cmp(&b.score)) else {
            counter!("classify_skipped_total").increment(1);
            continue;
        };

        match map_label(&top.label) {
            Label::Positive => counts.positive += 1,
            Label::Negative => counts.negative += 1,
            Label::Neutral => counts.neutral += 1,
        }
    }

    SentimentTally::from_counts(counts)
}
