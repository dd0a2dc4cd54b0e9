//! One synchronous run of the selection and keyword-trend engine.
//!
//! ```text
//! FeedBatch* ──normalize──▶ Article* ──select──▶ Article* (≤ K)
//!                                                   │
//!                                             extract keywords
//!                                                   │
//!                       Snapshot (yesterday) ──▶ classify ──▶ TrendReport
//!                                                   │
//!                                        save today's counts
//! ```
//!
//! The engine owns no I/O besides the [`SnapshotStore`] it is handed, and no
//! step can fail: zero articles produce an empty report.

use crate::config::TrendConfig;
use crate::keywords::KeywordExtractor;
use crate::models::{Article, FeedBatch, KeywordCount, TrendReport, to_snapshot};
use crate::normalize::normalize_batches;
use crate::selector::{SelectionPolicy, select_articles};
use crate::snapshot::SnapshotStore;
use crate::trends::classify_trends;
use chrono::NaiveDateTime;
use std::error::Error;
use tracing::{info, instrument, warn};

/// The configured engine, reusable across runs.
#[derive(Debug)]
pub struct TrendEngine {
    policy: SelectionPolicy,
    extractor: KeywordExtractor,
    max_entries_per_feed: Option<usize>,
}

impl TrendEngine {
    pub fn new(config: &TrendConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            policy: SelectionPolicy::from_config(config),
            extractor: KeywordExtractor::new(config)?,
            max_entries_per_feed: config.max_entries_per_feed,
        })
    }

    /// Normalize and select the articles to report on.
    pub fn select(&self, batches: &[FeedBatch], now: NaiveDateTime) -> Vec<Article> {
        let articles = normalize_batches(batches, self.max_entries_per_feed);
        select_articles(articles, now, &self.policy)
    }

    pub fn keywords(&self, articles: &[Article]) -> Vec<KeywordCount> {
        self.extractor.extract(articles)
    }

    /// Run the whole pipeline and persist today's counts as the next
    /// baseline.
    ///
    /// The report is complete before the snapshot is written; a failed save
    /// is logged and the report is still returned.
    #[instrument(level = "info", skip_all, fields(feeds = batches.len(), %now))]
    pub fn run(
        &self,
        batches: &[FeedBatch],
        store: &dyn SnapshotStore,
        now: NaiveDateTime,
    ) -> TrendReport {
        let articles = self.select(batches, now);
        let keywords = self.keywords(&articles);

        let baseline = store.load();
        let trends = classify_trends(&keywords, &baseline);

        let report = TrendReport {
            generated_at: now,
            articles,
            keywords,
            trends,
        };

        if let Err(e) = store.save(&to_snapshot(&report.keywords)) {
            warn!(error = %e, "Failed to save keyword snapshot; report unaffected");
        }

        info!(
            articles = report.articles.len(),
            keywords = report.keywords.len(),
            "Trend run complete"
        );
        report
    }
}
