//! Static HTML rendering of a [`TrendReport`].
//!
//! Produces a single self-contained `index.html`: a header with the update
//! time, a strip of trending keyword chips (tag and signed delta), and one
//! card per selected article in selection order.

use crate::models::{Article, TrendEntry, TrendReport, TrendTag};
use crate::utils::{escape_html, slugify_title, truncate_chars};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const SUMMARY_CHARS: usize = 200;
const DATE_CHARS: usize = 16;

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #f1f3f8; padding: 20px; line-height: 1.6; }
.container { max-width: 1200px; margin: 0 auto; background: white; border-radius: 15px; overflow: hidden; }
.header { background: linear-gradient(135deg, #4facfe 0%, #00f2fe 100%); color: white; padding: 30px; text-align: center; }
.update-time { background: #f8f9fa; padding: 15px; text-align: center; color: #6c757d; font-size: 0.9rem; }
.trends { padding: 30px; display: flex; flex-wrap: wrap; gap: 10px; }
.trend-tag { padding: 8px 15px; border-radius: 20px; font-size: 0.9rem; background: #e3f2fd; color: #1976d2; }
.trend-tag .tag { font-weight: 700; margin-left: 6px; }
.tag-new { background: #e8f5e9; color: #2e7d32; }
.tag-hot { background: #ffebee; color: #c62828; }
.tag-rising { background: #fff8e1; color: #ef6c00; }
.news-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(350px, 1fr)); gap: 20px; padding: 30px; }
.news-card { border: 1px solid #e9ecef; border-radius: 10px; padding: 20px; }
.news-meta { display: flex; justify-content: space-between; margin-bottom: 15px; font-size: 0.8rem; }
.news-source { background: #e8f5e8; color: #2e7d32; padding: 5px 10px; border-radius: 5px; }
.news-date { color: #95a5a6; }
.empty { padding: 60px; text-align: center; color: #6c757d; }
.footer { background: #2c3e50; color: white; padding: 20px; text-align: center; }
"#;

fn tag_class(tag: TrendTag) -> &'static str {
    match tag {
        TrendTag::New => "tag-new",
        TrendTag::Hot => "tag-hot",
        TrendTag::Rising => "tag-rising",
        TrendTag::Flat => "tag-flat",
    }
}

/// Format a delta with an explicit sign: `+3`, `-1`, `0`.
pub fn signed_delta(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

fn render_trend(out: &mut String, trend: &TrendEntry) {
    writeln!(
        out,
        r#"<span class="trend-tag {}" title="{} mentions">{}<span class="tag">{} {}</span></span>"#,
        tag_class(trend.tag),
        trend.count,
        escape_html(&trend.keyword),
        trend.tag,
        signed_delta(trend.delta)
    )
    .unwrap();
}

fn render_article(out: &mut String, article: &Article) {
    let date = article
        .published_raw
        .as_deref()
        .map(|raw| truncate_chars(raw, DATE_CHARS))
        .unwrap_or_default();
    let summary = truncate_chars(&article.summary, SUMMARY_CHARS);
    let ellipsis = if summary.len() < article.summary.len() { "..." } else { "" };

    writeln!(
        out,
        r#"<div class="news-card" id="{}">
  <div class="news-meta"><span class="news-source">{}</span><span class="news-date">{}</span></div>
  <h3>{}</h3>
  <p>{}{}</p>
  <a href="{}" target="_blank" rel="noopener" class="read-more">Read more</a>
</div>"#,
        escape_html(&slugify_title(&article.title)),
        escape_html(&article.source),
        escape_html(date),
        escape_html(&article.title),
        escape_html(summary),
        ellipsis,
        escape_html(&article.link)
    )
    .unwrap();
}

/// Render the full page.
pub fn render_report(report: &TrendReport) -> String {
    let mut html = String::new();
    let date = report.generated_at.format("%Y-%m-%d");
    let updated = report.generated_at.format("%Y-%m-%d %H:%M");

    writeln!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>AI News Daily | {date}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<div class="header"><h1>AI News Daily</h1><p>Today's AI headlines and trending keywords</p></div>
<div class="update-time">Last updated: {updated}</div>"#
    )
    .unwrap();

    if report.is_empty() {
        html.push_str("<div class=\"empty\">No news today.</div>\n");
    } else {
        html.push_str("<div class=\"trends\">\n");
        for trend in &report.trends {
            render_trend(&mut html, trend);
        }
        html.push_str("</div>\n<div class=\"news-grid\">\n");
        for article in &report.articles {
            render_article(&mut html, article);
        }
        html.push_str("</div>\n");
    }

    html.push_str("<div class=\"footer\"><p>Updated daily</p></div>\n</div>\n</body>\n</html>\n");
    html
}

/// Render `report` to `{output_dir}/index.html`.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_report_html(
    report: &TrendReport,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(output_dir).join("index.html");
    fs::write(&path, render_report(report)).await?;
    info!(path = %path.display(), "Wrote HTML report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeywordCount;
    use chrono::NaiveDate;

    fn report(articles: Vec<Article>) -> TrendReport {
        TrendReport {
            generated_at: NaiveDate::from_ymd_opt(2025, 5, 6)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            articles,
            keywords: vec![KeywordCount::new("GPT-5", 6)],
            trends: vec![TrendEntry {
                keyword: "GPT-5".to_string(),
                count: 6,
                tag: TrendTag::Hot,
                delta: 3,
            }],
        }
    }

    fn article() -> Article {
        Article {
            title: "OpenAI <script>alert(1)</script>".to_string(),
            summary: "x".repeat(250),
            link: "https://example.com/a?b=1&c=2".to_string(),
            published_raw: Some("Tue, 06 May 2025 14:30:00 +0000".to_string()),
            published_at: None,
            source: "AI News".to_string(),
        }
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(3), "+3");
        assert_eq!(signed_delta(0), "0");
        assert_eq!(signed_delta(-2), "-2");
    }

    #[test]
    fn test_render_escapes_and_truncates() {
        let html = render_report(&report(vec![article()]));
        assert_eq!(html.matches(r#"class="news-card""#).count(), 1);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("OpenAI &lt;script&gt;"));
        assert!(html.contains("https://example.com/a?b=1&amp;c=2"));
        assert!(html.contains(&format!("{}...", "x".repeat(200))));
        assert!(!html.contains(&"x".repeat(201)));
        assert!(html.contains("Tue, 06 May 2025<"));
        assert!(html.contains("HOT +3"));
        assert!(html.contains("AI News Daily | 2025-05-06"));
    }

    #[test]
    fn test_render_empty_report() {
        let mut empty = report(vec![]);
        empty.keywords.clear();
        empty.trends.clear();
        let html = render_report(&empty);
        assert!(html.contains("No news today."));
        assert!(!html.contains(r#"class="news-card""#));
    }
}
