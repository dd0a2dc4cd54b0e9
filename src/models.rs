//! Data models for feed entries, selected articles, and keyword trends.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawEntry`] / [`FeedBatch`]: Unprocessed entries as a feed delivered them
//! - [`Article`]: A normalized entry with a resolved publication time
//! - [`KeywordCount`]: One ranked keyword and its occurrence count
//! - [`TrendEntry`] / [`TrendTag`]: Day-over-day classification of a keyword
//! - [`TrendReport`]: Everything a single run hands to the report writers

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single entry as delivered by a feed, before normalization.
///
/// Every field is optional because feeds disagree wildly on what they
/// publish. `published_parsed` mirrors the six leading components of a
/// structured time tuple (year, month, day, hour, minute, second) when the
/// producer already parsed the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub published_parsed: Option<Vec<i32>>,
}

/// All entries pulled from one feed, plus the feed's identity.
///
/// `title` is the feed-level display title; `url` doubles as the fallback
/// source name when the feed has no title.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeedBatch {
    pub url: String,
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// A normalized article.
///
/// `title` is always present. `published_at` is either a real timestamp or
/// `None`; it is never a placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Headline, also the deduplication key once trimmed and lowercased.
    pub title: String,
    /// Summary text, empty when the feed provided none.
    pub summary: String,
    /// Link to the full story.
    pub link: String,
    /// The timestamp exactly as the feed wrote it.
    pub published_raw: Option<String>,
    /// The parsed timestamp, treated as naive local time.
    pub published_at: Option<NaiveDateTime>,
    /// Display name of the feed the article came from.
    pub source: String,
}

impl Article {
    /// Key used to collapse duplicate headlines across feeds.
    pub fn dedup_key(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

/// A keyword and how often it occurred in the run's corpus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u32,
}

impl KeywordCount {
    pub fn new(keyword: impl Into<String>, count: u32) -> Self {
        Self {
            keyword: keyword.into(),
            count,
        }
    }
}

/// The persisted keyword mapping from the previous run.
pub type Snapshot = BTreeMap<String, u32>;

/// Convert ranked keyword counts into the persisted snapshot shape.
pub fn to_snapshot(counts: &[KeywordCount]) -> Snapshot {
    counts
        .iter()
        .map(|kc| (kc.keyword.clone(), kc.count))
        .collect()
}

/// Day-over-day trend category for a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendTag {
    /// Absent from yesterday's snapshot.
    New,
    /// At least doubled since yesterday.
    Hot,
    /// Grew, but by less than double.
    Rising,
    /// Unchanged, shrinking, or no baseline to compare against.
    Flat,
}

impl fmt::Display for TrendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendTag::New => "NEW",
            TrendTag::Hot => "HOT",
            TrendTag::Rising => "RISING",
            TrendTag::Flat => "FLAT",
        };
        f.write_str(s)
    }
}

/// A classified keyword, in the same order as the ranked keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrendEntry {
    pub keyword: String,
    pub count: u32,
    pub tag: TrendTag,
    pub delta: i64,
}

/// The output of one run, consumed by the report writers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendReport {
    /// Local wall-clock time the run treated as "now".
    pub generated_at: NaiveDateTime,
    /// Selected, deduplicated articles in display order.
    pub articles: Vec<Article>,
    /// Top keywords by descending count.
    pub keywords: Vec<KeywordCount>,
    /// One trend entry per keyword.
    pub trends: Vec<TrendEntry>,
}

impl TrendReport {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: String::new(),
            link: "https://example.com".to_string(),
            published_raw: None,
            published_at: None,
            source: "Example".to_string(),
        }
    }

    #[test]
    fn test_dedup_key_ignores_case_and_outer_whitespace() {
        assert_eq!(
            article("GPT-5 Launches").dedup_key(),
            article("  gpt-5 launches ").dedup_key()
        );
    }

    #[test]
    fn test_trend_tag_serializes_uppercase() {
        let json = serde_json::to_string(&TrendTag::Rising).unwrap();
        assert_eq!(json, "\"RISING\"");
        let tag: TrendTag = serde_json::from_str("\"HOT\"").unwrap();
        assert_eq!(tag, TrendTag::Hot);
        assert_eq!(TrendTag::New.to_string(), "NEW");
    }

    #[test]
    fn test_raw_entry_deserializes_partial_fields() {
        let json = r#"{"title": "Hello", "published_parsed": [2025, 5, 6, 14, 30, 0, 1, 126, 0]}"#;
        let entry: RawEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.title.as_deref(), Some("Hello"));
        assert!(entry.summary.is_none());
        assert_eq!(entry.published_parsed.unwrap().len(), 9);
    }

    #[test]
    fn test_to_snapshot() {
        let counts = vec![KeywordCount::new("OpenAI", 7), KeywordCount::new("Nvidia", 3)];
        let snapshot = to_snapshot(&counts);
        assert_eq!(snapshot.get("OpenAI"), Some(&7));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_report_serialization() {
        let report = TrendReport {
            generated_at: NaiveDate::from_ymd_opt(2025, 5, 6)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            articles: vec![article("Test Article")],
            keywords: vec![KeywordCount::new("Claude", 4)],
            trends: vec![TrendEntry {
                keyword: "Claude".to_string(),
                count: 4,
                tag: TrendTag::New,
                delta: 4,
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("2025-05-06T10:00:00"));
        assert!(json.contains("\"NEW\""));
        assert!(!report.is_empty());
    }
}
