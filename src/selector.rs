//! Recency-based article selection.
//!
//! Articles are split into three buckets relative to `now`:
//!
//! | Bucket | Condition |
//! |--------|-----------|
//! | recent | `published_at >= now - recent_window` |
//! | older | `now - older_window <= published_at < now - recent_window` |
//! | undated | no `published_at` |
//!
//! Anything dated before the older window is dropped. The final list is
//! filled from `recent` first and only relaxes to `older`, then `undated`,
//! when there are too few fresh stories. Duplicate headlines are collapsed
//! across all buckets before filling, keeping the first (most
//! time-relevant) occurrence, so a repeated story never takes a slot.

use crate::config::TrendConfig;
use crate::models::Article;
use chrono::{Duration, NaiveDateTime};
use itertools::Itertools;
use tracing::{debug, info, instrument};

/// Selection thresholds, usually taken from [`TrendConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Target list length (K).
    pub target: usize,
    /// Minimum length considered sufficient before relaxing recency (S).
    pub sufficient: usize,
    pub recent_window: Duration,
    pub older_window: Duration,
}

impl SelectionPolicy {
    pub fn from_config(config: &TrendConfig) -> Self {
        Self {
            target: config.target_count,
            sufficient: config.sufficient_count,
            recent_window: Duration::hours(config.recent_window_hours),
            older_window: Duration::hours(config.older_window_hours),
        }
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from_config(&TrendConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum Age {
    Recent,
    Older,
    Undated,
}

/// Articles partitioned by age.
#[derive(Debug, Default)]
struct Buckets {
    recent: Vec<Article>,
    older: Vec<Article>,
    undated: Vec<Article>,
}

fn partition(articles: Vec<Article>, now: NaiveDateTime, policy: &SelectionPolicy) -> Buckets {
    let recent_cutoff = now - policy.recent_window;
    let older_cutoff = now - policy.older_window;

    let mut buckets = Buckets::default();
    let mut stale = 0usize;
    for article in articles {
        match article.published_at {
            Some(t) if t >= recent_cutoff => buckets.recent.push(article),
            Some(t) if t >= older_cutoff => buckets.older.push(article),
            Some(_) => stale += 1,
            None => buckets.undated.push(article),
        }
    }

    // Stable sort: equal timestamps keep their encounter order.
    buckets.recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    buckets.older.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    debug!(
        recent = buckets.recent.len(),
        older = buckets.older.len(),
        undated = buckets.undated.len(),
        stale,
        "Partitioned articles"
    );
    buckets
}

/// Drop repeated titles across the buckets, walking recent, older, then
/// undated, and keeping the first occurrence.
fn dedup_titles(buckets: Buckets) -> Buckets {
    let Buckets {
        recent,
        older,
        undated,
    } = buckets;

    let unique = recent
        .into_iter()
        .map(|a| (Age::Recent, a))
        .chain(older.into_iter().map(|a| (Age::Older, a)))
        .chain(undated.into_iter().map(|a| (Age::Undated, a)))
        .unique_by(|(_, a)| a.dedup_key());

    let mut out = Buckets::default();
    for (age, article) in unique {
        match age {
            Age::Recent => out.recent.push(article),
            Age::Older => out.older.push(article),
            Age::Undated => out.undated.push(article),
        }
    }
    out
}

/// Pick at most `policy.target` articles, freshest first.
///
/// Running the selection again on its own output (with the target set to
/// the output length) returns the same list.
#[instrument(level = "info", skip_all, fields(input = articles.len(), %now))]
pub fn select_articles(
    articles: Vec<Article>,
    now: NaiveDateTime,
    policy: &SelectionPolicy,
) -> Vec<Article> {
    let Buckets {
        recent,
        older,
        undated,
    } = dedup_titles(partition(articles, now, policy));

    let chosen: Vec<Article> = if recent.len() >= policy.sufficient {
        recent.into_iter().take(policy.target).collect()
    } else {
        let room = policy.target.saturating_sub(recent.len());
        let mut list = recent;
        list.extend(older.into_iter().take(room));
        if list.len() < policy.sufficient {
            let missing = policy.sufficient - list.len();
            list.extend(undated.into_iter().take(missing));
        }
        list.truncate(policy.target);
        list
    };

    info!(count = chosen.len(), "Selected articles");
    chosen
}
