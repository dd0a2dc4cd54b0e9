//! Feed fetching and RSS/Atom parsing.
//!
//! Feeds are fetched one after another. Each request is bounded by the
//! configured timeout and retried a few times with exponential backoff; a
//! feed that still fails contributes an empty batch and the run continues.
//!
//! # Architecture
//!
//! - [`FetchFeed`]: Core trait for retrieving a feed document by URL
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchFeed`
//! - [`parse_feed`]: Turns an RSS 2.0 or Atom document into a [`FeedBatch`]
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::{FeedSource, TrendConfig};
use crate::models::{FeedBatch, RawEntry};
use crate::utils::{strip_html, truncate_for_log};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rand::{Rng, rng};
use reqwest::Client;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Trait for retrieving a feed document.
pub trait FetchFeed {
    /// Fetch the raw document at `url`.
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// Plain HTTP fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: StdDuration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl FetchFeed for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchFeed`].
pub struct RetryFetch<T> {
    /// The underlying fetcher to wrap.
    inner: T,
    /// Maximum number of retries after the first attempt.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchFeed,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(10),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchFeed for RetryFetch<T>
where
    T: FetchFeed,
{
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self
                        .base_delay
                        .saturating_mul(1u32 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Which element of an entry the text currently being read belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Description,
    Content,
    Published,
    Updated,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"summary" => Some(Field::Summary),
            b"description" => Some(Field::Description),
            b"content" | b"content:encoded" => Some(Field::Content),
            b"pubDate" | b"published" | b"dc:date" => Some(Field::Published),
            b"updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryDraft {
    title: String,
    link: String,
    summary: String,
    description: String,
    content: String,
    published: String,
    updated: String,
}

impl EntryDraft {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        target.push_str(text);
    }

    fn finish(self) -> RawEntry {
        let keep = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        let html = |s: String| keep(strip_html(&s));

        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        let summary = html(self.summary).or_else(|| html(self.content));
        RawEntry {
            title: keep(title),
            summary,
            description: html(self.description),
            link: keep(self.link),
            published: keep(self.published).or_else(|| keep(self.updated)),
            published_parsed: None,
        }
    }
}

fn href_of(tag: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut alternate = true;
    for attr in tag.attributes().flatten() {
        match attr.key.as_ref() {
            b"href" => href = Some(String::from_utf8_lossy(&attr.value).into_owned()),
            b"rel" => alternate = attr.value.as_ref() == b"alternate",
            _ => {}
        }
    }
    if alternate { href } else { None }
}

fn resolve_entity(name: &str) -> Option<String> {
    let resolved = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)?
        }
    };
    Some(resolved.to_string())
}

/// Parse an RSS 2.0 or Atom document.
///
/// Items (`<item>`) and entries (`<entry>`) become [`RawEntry`]s; the
/// channel/feed `<title>` becomes the batch title. Markup inside summaries
/// is reduced to text.
pub fn parse_feed(xml: &str, url: &str) -> Result<FeedBatch, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut feed_title: Option<String> = None;
    let mut entries = Vec::new();
    let mut draft: Option<EntryDraft> = None;
    let mut field: Option<Field> = None;
    let mut in_feed_title = false;
    let mut title_buf = String::new();
    let mut depth = 0usize;
    let mut entry_depth = 0usize;
    let mut field_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                let name = name.as_ref();
                match name {
                    b"item" | b"entry" => {
                        draft = Some(EntryDraft::default());
                        field = None;
                        entry_depth = depth;
                    }
                    // Only direct children; Atom `<source>` nests its own title and link.
                    _ if draft.is_some() && field.is_none() && depth == entry_depth + 1 => {
                        field = Field::from_tag(name);
                        field_depth = depth;
                        if field == Some(Field::Link) {
                            if let (Some(d), Some(href)) = (draft.as_mut(), href_of(&e)) {
                                if d.link.is_empty() {
                                    d.link = href;
                                }
                            }
                        }
                    }
                    b"title" if draft.is_none() && feed_title.is_none() => {
                        in_feed_title = true;
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"link" && depth == entry_depth {
                    if let (Some(d), Some(href)) = (draft.as_mut(), href_of(&e)) {
                        if d.link.is_empty() {
                            d.link = href;
                        }
                    }
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"item" | b"entry" => {
                        if let Some(d) = draft.take() {
                            entries.push(d.finish());
                        }
                        field = None;
                    }
                    b"title" if in_feed_title => {
                        in_feed_title = false;
                        let t = strip_html(&title_buf);
                        if !t.is_empty() {
                            feed_title = Some(t);
                        }
                    }
                    _ if field.is_some() && depth == field_depth => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                let text = String::from_utf8_lossy(&t);
                append_text(&mut draft, field, in_feed_title, &mut title_buf, &text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c);
                append_text(&mut draft, field, in_feed_title, &mut title_buf, &text);
            }
            Event::GeneralRef(r) => {
                let name = String::from_utf8_lossy(&r);
                if let Some(text) = resolve_entity(&name) {
                    append_text(&mut draft, field, in_feed_title, &mut title_buf, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!(%url, entries = entries.len(), title = ?feed_title, "Parsed feed");
    Ok(FeedBatch {
        url: url.to_string(),
        title: feed_title,
        entries,
    })
}

fn append_text(
    draft: &mut Option<EntryDraft>,
    field: Option<Field>,
    in_feed_title: bool,
    title_buf: &mut String,
    text: &str,
) {
    if let (Some(d), Some(f)) = (draft.as_mut(), field) {
        d.push(f, text);
    } else if in_feed_title {
        title_buf.push_str(text);
    }
}

/// Fetch and parse a single feed.
#[instrument(level = "info", skip(fetcher), fields(url = %source.url))]
pub async fn fetch_feed<F: FetchFeed>(
    fetcher: &F,
    source: &FeedSource,
) -> Result<FeedBatch, Box<dyn Error>> {
    let url = Url::parse(&source.url)?;
    let body = fetcher.fetch(url.as_str()).await?;
    let mut batch = parse_feed(&body, &source.url).map_err(|e| {
        warn!(preview = %truncate_for_log(&body, 200), "Feed body did not parse");
        e
    })?;
    if let Some(name) = &source.name {
        batch.title = Some(name.clone());
    }
    Ok(batch)
}

/// Fetch every configured feed in order.
///
/// A feed that fails is logged and contributes an empty batch; the result
/// always has one batch per configured feed.
#[instrument(level = "info", skip_all, fields(feeds = config.feeds.len()))]
pub async fn collect_feeds(config: &TrendConfig) -> Result<Vec<FeedBatch>, Box<dyn Error>> {
    let http = HttpFetcher::new(StdDuration::from_secs(config.feed_timeout_secs))?;
    let fetcher = RetryFetch::new(http, config.feed_retries, StdDuration::from_secs(1));
    Ok(collect_with(&fetcher, &config.feeds).await)
}

/// Fetch `sources` in order with an arbitrary fetcher.
pub async fn collect_with<F: FetchFeed>(fetcher: &F, sources: &[FeedSource]) -> Vec<FeedBatch> {
    let mut batches = Vec::with_capacity(sources.len());
    for source in sources {
        let t0 = Instant::now();
        match fetch_feed(fetcher, source).await {
            Ok(batch) => {
                info!(
                    url = %source.url,
                    entries = batch.entries.len(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Fetched feed"
                );
                batches.push(batch);
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "Feed failed; skipping");
                batches.push(FeedBatch {
                    url: source.url.clone(),
                    title: source.name.clone(),
                    entries: Vec::new(),
                });
            }
        }
    }
    let total: usize = batches.iter().map(|b| b.entries.len()).sum();
    info!(total_entries = total, "Collected feeds");
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>AI News &amp; Views</title>
    <link>https://ainews.example</link>
    <item>
      <title>OpenAI ships GPT-5</title>
      <link>https://ainews.example/gpt5</link>
      <description><![CDATA[<p>The <b>new</b> model is here.</p>]]></description>
      <pubDate>Tue, 06 May 2025 14:30:00 +0000</pubDate>
    </item>
    <item>
      <title>Nvidia &lt;earnings&gt;</title>
      <link>https://ainews.example/nvda</link>
      <dc:date>2025-05-06T08:00:00Z</dc:date>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">The Verge AI</title>
  <link rel="self" href="https://verge.example/rss"/>
  <entry>
    <title>Claude gets a memory</title>
    <link rel="alternate" href="https://verge.example/claude"/>
    <published>2025-05-06T10:00:00-04:00</published>
    <updated>2025-05-06T11:00:00-04:00</updated>
    <content type="html">&lt;p&gt;Anthropic adds memory.&lt;/p&gt;</content>
  </entry>
  <entry>
    <title>Untimed entry</title>
    <summary>Short summary</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let batch = parse_feed(RSS, "https://ainews.example/rss").unwrap();
        assert_eq!(batch.title.as_deref(), Some("AI News & Views"));
        assert_eq!(batch.entries.len(), 2);

        let first = &batch.entries[0];
        assert_eq!(first.title.as_deref(), Some("OpenAI ships GPT-5"));
        assert_eq!(first.link.as_deref(), Some("https://ainews.example/gpt5"));
        assert_eq!(first.description.as_deref(), Some("The new model is here."));
        assert_eq!(first.summary, None);
        assert_eq!(
            first.published.as_deref(),
            Some("Tue, 06 May 2025 14:30:00 +0000")
        );

        let second = &batch.entries[1];
        assert_eq!(second.title.as_deref(), Some("Nvidia <earnings>"));
        assert_eq!(second.published.as_deref(), Some("2025-05-06T08:00:00Z"));
    }

    #[test]
    fn test_parse_atom() {
        let batch = parse_feed(ATOM, "https://verge.example/rss").unwrap();
        assert_eq!(batch.title.as_deref(), Some("The Verge AI"));
        assert_eq!(batch.entries.len(), 2);

        let first = &batch.entries[0];
        assert_eq!(first.link.as_deref(), Some("https://verge.example/claude"));
        assert_eq!(first.published.as_deref(), Some("2025-05-06T10:00:00-04:00"));
        assert_eq!(first.summary.as_deref(), Some("Anthropic adds memory."));

        let second = &batch.entries[1];
        assert_eq!(second.summary.as_deref(), Some("Short summary"));
        assert_eq!(second.published, None);
        assert_eq!(second.link, None);
    }

    #[test]
    fn test_atom_source_element_does_not_leak_into_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Aggregator</title>
  <entry>
    <source>
      <title>Origin Feed</title>
      <link rel="alternate" href="https://origin.example/"/>
    </source>
    <title>Gemini update</title>
    <link rel="alternate" href="https://agg.example/gemini"/>
  </entry>
</feed>"#;
        let batch = parse_feed(xml, "https://agg.example/atom").unwrap();
        assert_eq!(batch.title.as_deref(), Some("Aggregator"));
        let entry = &batch.entries[0];
        assert_eq!(entry.title.as_deref(), Some("Gemini update"));
        assert_eq!(entry.link.as_deref(), Some("https://agg.example/gemini"));
    }

    #[test]
    fn test_parse_malformed_feed_is_an_error() {
        assert!(parse_feed("<rss><channel><item></channel></rss>", "u").is_err());
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#39").as_deref(), Some("'"));
        assert_eq!(resolve_entity("#x2019").as_deref(), Some("\u{2019}"));
        assert_eq!(resolve_entity("bogus"), None);
    }

    struct StubFetcher {
        bodies: HashMap<String, String>,
        calls: Cell<usize>,
    }

    impl FetchFeed for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| format!("no body for {url}").into())
        }
    }

    fn source(url: &str, name: Option<&str>) -> FeedSource {
        FeedSource {
            url: url.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_collect_skips_failing_feeds() {
        let fetcher = StubFetcher {
            bodies: HashMap::from([
                ("https://ok.example/rss".to_string(), RSS.to_string()),
                ("https://bad.example/rss".to_string(), "<rss><oops".to_string()),
            ]),
            calls: Cell::new(0),
        };
        let sources = vec![
            source("https://missing.example/rss", None),
            source("https://ok.example/rss", Some("Renamed")),
            source("not a url", None),
            source("https://bad.example/rss", None),
        ];

        let batches = collect_with(&fetcher, &sources).await;
        assert_eq!(batches.len(), 4);
        assert!(batches[0].entries.is_empty());
        assert_eq!(batches[1].entries.len(), 2);
        assert_eq!(batches[1].title.as_deref(), Some("Renamed"));
        assert!(batches[2].entries.is_empty());
        assert!(batches[3].entries.is_empty());
        // The invalid URL never reaches the fetcher.
        assert_eq!(fetcher.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let stub = StubFetcher {
            bodies: HashMap::new(),
            calls: Cell::new(0),
        };
        let retry = RetryFetch::new(stub, 2, StdDuration::from_millis(1));
        assert!(retry.fetch("https://down.example/rss").await.is_err());
        assert_eq!(retry.inner.calls.get(), 3);
    }
}
