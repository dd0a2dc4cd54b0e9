//! Day-over-day trend classification.
//!
//! Each of today's keywords is compared against yesterday's snapshot:
//!
//! | Yesterday `y` | Today `c` | Tag | Delta |
//! |---|---|---|---|
//! | snapshot empty | any | FLAT | 0 |
//! | 0 | any | NEW | `c` |
//! | > 0 | `c >= 2y` | HOT | `c - y` |
//! | > 0 | `y < c < 2y` | RISING | `c - y` |
//! | > 0 | `c <= y` | FLAT | `c - y` |
//!
//! Keywords that dropped out since yesterday are not reported.

use crate::models::{KeywordCount, Snapshot, TrendEntry, TrendTag};
use tracing::{debug, info, instrument};

/// Classify one keyword against a non-empty baseline.
pub fn classify_count(today: u32, yesterday: u32) -> (TrendTag, i64) {
    let c = i64::from(today);
    let y = i64::from(yesterday);
    let tag = if y == 0 {
        TrendTag::New
    } else if c >= 2 * y {
        TrendTag::Hot
    } else if c > y {
        TrendTag::Rising
    } else {
        TrendTag::Flat
    };
    (tag, c - y)
}

/// Classify every keyword of today's ranking, keeping its order.
#[instrument(level = "info", skip_all, fields(keywords = today.len(), baseline = yesterday.len()))]
pub fn classify_trends(today: &[KeywordCount], yesterday: &Snapshot) -> Vec<TrendEntry> {
    if yesterday.is_empty() {
        info!("No baseline snapshot; every keyword is FLAT");
        return today
            .iter()
            .map(|kc| TrendEntry {
                keyword: kc.keyword.clone(),
                count: kc.count,
                tag: TrendTag::Flat,
                delta: 0,
            })
            .collect();
    }

    let trends: Vec<TrendEntry> = today
        .iter()
        .map(|kc| {
            let previous = yesterday.get(&kc.keyword).copied().unwrap_or(0);
            let (tag, delta) = classify_count(kc.count, previous);
            debug!(keyword = %kc.keyword, count = kc.count, previous, %tag, delta, "Classified keyword");
            TrendEntry {
                keyword: kc.keyword.clone(),
                count: kc.count,
                tag,
                delta,
            }
        })
        .collect();

    info!(
        new = trends.iter().filter(|t| t.tag == TrendTag::New).count(),
        hot = trends.iter().filter(|t| t.tag == TrendTag::Hot).count(),
        rising = trends.iter().filter(|t| t.tag == TrendTag::Rising).count(),
        "Classified trends"
    );
    trends
}
