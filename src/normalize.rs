//! Article normalization.
//!
//! Turns the loosely-typed [`RawEntry`] a feed hands us into an [`Article`]:
//! optional fields are resolved to their documented defaults and the
//! publication time is recovered from whichever representation the feed
//! provided. Nothing here fails; an entry that cannot be dated simply has
//! no `published_at`.

use crate::models::{Article, FeedBatch, RawEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, instrument};

/// Naive formats tried after RFC 2822 / RFC 3339 fail.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Offset-bearing formats; the offset is dropped after parsing.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %b %Y"];

/// Build a timestamp from the leading six components of a time tuple.
///
/// Returns `None` when fewer than six components are present or they do
/// not form a valid calendar date and time.
pub fn from_time_tuple(parts: &[i32]) -> Option<NaiveDateTime> {
    let [year, month, day, hour, minute, second, ..] = parts else {
        return None;
    };
    let date = NaiveDate::from_ymd_opt(
        *year,
        u32::try_from(*month).ok()?,
        u32::try_from(*day).ok()?,
    )?;
    date.and_hms_opt(
        u32::try_from(*hour).ok()?,
        u32::try_from(*minute).ok()?,
        u32::try_from(*second).ok()?,
    )
}

/// Leniently parse a textual timestamp.
///
/// RFC 2822 (RSS) and RFC 3339 (Atom) are tried first, then a handful of
/// common layouts with and without offsets, then bare dates (midnight).
/// When the text carries a timezone offset it is discarded and the
/// wall-clock time kept, so every result is naive.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    // Named zones other than the RFC 2822 set ("EST", "PDT", ...) are not
    // resolvable with chrono alone; drop the trailing zone and keep the
    // wall-clock part.
    let without_zone = match s.rsplit_once(' ') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_alphabetic()) => head,
        _ => s,
    };
    for candidate in [s, without_zone] {
        for fmt in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(dt);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(candidate, fmt) {
                return d.and_hms_opt(0, 0, 0);
            }
        }
    }
    None
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Normalize one raw entry.
///
/// `feed_title` is the feed's display name and `fallback_source` (the feed
/// URL) is used when the feed has no title. Entries without a usable title
/// cannot be deduplicated or displayed and are skipped.
pub fn normalize_entry(
    entry: &RawEntry,
    feed_title: Option<&str>,
    fallback_source: &str,
) -> Option<Article> {
    let Some(title) = non_blank(entry.title.as_ref()) else {
        debug!(source = fallback_source, "Skipping entry without a title");
        return None;
    };

    let summary = entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .unwrap_or_default()
        .to_string();

    let published_raw = entry.published.clone();
    let published_at = entry
        .published_parsed
        .as_deref()
        .and_then(from_time_tuple)
        .or_else(|| published_raw.as_deref().and_then(parse_timestamp));
    if published_at.is_none() {
        if let Some(raw) = &published_raw {
            debug!(%raw, "Unparseable publication time; leaving undated");
        }
    }

    let source = match feed_title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => fallback_source.to_string(),
    };

    Some(Article {
        title: title.to_string(),
        summary,
        link: entry.link.clone().unwrap_or_default(),
        published_raw,
        published_at,
        source,
    })
}

/// Normalize every entry of every batch.
///
/// With a `per_feed_limit`, each feed keeps only its newest entries; undated
/// entries rank last and keep the order the feed listed them in.
#[instrument(level = "info", skip_all, fields(feeds = batches.len(), ?per_feed_limit))]
pub fn normalize_batches(batches: &[FeedBatch], per_feed_limit: Option<usize>) -> Vec<Article> {
    let mut articles = Vec::new();
    for batch in batches {
        let mut from_feed: Vec<Article> = batch
            .entries
            .iter()
            .filter_map(|entry| normalize_entry(entry, batch.title.as_deref(), &batch.url))
            .collect();
        if let Some(limit) = per_feed_limit {
            from_feed.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            from_feed.truncate(limit);
        }
        articles.extend(from_feed);
    }
    debug!(count = articles.len(), "Normalized articles");
    articles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn entry(title: &str) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_prefers_summary_then_description() {
        let mut e = entry("T");
        e.summary = Some("from summary".to_string());
        e.description = Some("from description".to_string());
        let a = normalize_entry(&e, Some("Feed"), "https://feed").unwrap();
        assert_eq!(a.summary, "from summary");

        e.summary = None;
        let a = normalize_entry(&e, Some("Feed"), "https://feed").unwrap();
        assert_eq!(a.summary, "from description");

        e.description = None;
        let a = normalize_entry(&e, Some("Feed"), "https://feed").unwrap();
        assert_eq!(a.summary, "");
    }

    #[test]
    fn test_time_tuple_takes_priority_over_text() {
        let mut e = entry("T");
        e.published_parsed = Some(vec![2025, 5, 6, 14, 30, 15, 1, 126, 0]);
        e.published = Some("Wed, 01 Jan 2020 00:00:00 GMT".to_string());
        let a = normalize_entry(&e, None, "https://feed").unwrap();
        assert_eq!(a.published_at, Some(at(2025, 5, 6, 14, 30, 15)));
        assert_eq!(a.published_raw.as_deref(), Some("Wed, 01 Jan 2020 00:00:00 GMT"));
    }

    #[test]
    fn test_invalid_time_tuple_falls_back_to_text() {
        let mut e = entry("T");
        e.published_parsed = Some(vec![2025, 13, 40]);
        e.published = Some("2025-05-06T08:00:00Z".to_string());
        let a = normalize_entry(&e, None, "https://feed").unwrap();
        assert_eq!(a.published_at, Some(at(2025, 5, 6, 8, 0, 0)));
    }

    #[test]
    fn test_parse_rfc2822_drops_offset() {
        assert_eq!(
            parse_timestamp("Tue, 06 May 2025 14:30:00 +0900"),
            Some(at(2025, 5, 6, 14, 30, 0))
        );
        assert_eq!(
            parse_timestamp("Tue, 06 May 2025 14:30:00 GMT"),
            Some(at(2025, 5, 6, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_rfc3339_drops_offset() {
        assert_eq!(
            parse_timestamp("2025-05-06T14:30:00-04:00"),
            Some(at(2025, 5, 6, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_lenient_layouts() {
        assert_eq!(
            parse_timestamp("2025-05-06 14:30:00"),
            Some(at(2025, 5, 6, 14, 30, 0))
        );
        assert_eq!(
            parse_timestamp("2025-05-06 14:30:00 EST"),
            Some(at(2025, 5, 6, 14, 30, 0))
        );
        assert_eq!(parse_timestamp("2025-05-06"), Some(at(2025, 5, 6, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("May 06, 2025"),
            Some(at(2025, 5, 6, 0, 0, 0))
        );
    }

    #[test]
    fn test_unparseable_timestamp_is_absent() {
        let mut e = entry("T");
        e.published = Some("sometime last week".to_string());
        let a = normalize_entry(&e, None, "https://feed").unwrap();
        assert_eq!(a.published_at, None);
        assert_eq!(a.published_raw.as_deref(), Some("sometime last week"));
        assert_eq!(parse_timestamp("   "), None);
    }

    #[test]
    fn test_source_falls_back_to_feed_url() {
        let a = normalize_entry(&entry("T"), None, "https://feed").unwrap();
        assert_eq!(a.source, "https://feed");
        let a = normalize_entry(&entry("T"), Some(""), "https://feed").unwrap();
        assert_eq!(a.source, "https://feed");
        let a = normalize_entry(&entry("T"), Some("AI News"), "https://feed").unwrap();
        assert_eq!(a.source, "AI News");
        assert_eq!(a.link, "");
    }

    #[test]
    fn test_untitled_entries_are_skipped() {
        assert!(normalize_entry(&RawEntry::default(), None, "https://feed").is_none());
        assert!(normalize_entry(&entry("  "), None, "https://feed").is_none());
    }

    fn batches() -> Vec<FeedBatch> {
        let mut dated = entry("a-new");
        dated.published = Some("2025-05-06T10:00:00".to_string());
        let mut older = entry("a-old");
        older.published = Some("2025-05-05T10:00:00".to_string());
        vec![
            FeedBatch {
                url: "https://a".to_string(),
                title: Some("A".to_string()),
                entries: vec![entry("a-undated"), RawEntry::default(), older, dated],
            },
            FeedBatch {
                url: "https://b".to_string(),
                title: None,
                entries: vec![entry("b1")],
            },
        ]
    }

    #[test]
    fn test_normalize_batches_keeps_everything_without_limit() {
        let articles = normalize_batches(&batches(), None);
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a-undated", "a-old", "a-new", "b1"]);
        assert_eq!(articles[3].source, "https://b");
    }

    #[test]
    fn test_per_feed_limit_keeps_newest_entries() {
        let articles = normalize_batches(&batches(), Some(2));
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a-new", "a-old", "b1"]);
    }
}
