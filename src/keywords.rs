//! Keyword extraction from the selected articles.
//!
//! The rule set is deliberately simple and fully determined by
//! [`TrendConfig`]:
//!
//! 1. Titles and summaries are joined into one text blob.
//! 2. Compound phrases are folded first, in table order. Each phrase is
//!    matched literally and case-insensitively; its match count becomes the
//!    count of its label and every occurrence is replaced by a space so the
//!    words inside it are not counted again.
//! 3. The remaining text is split into tokens: maximal runs of ASCII
//!    letters, compared lowercased. Occurrence counts are whole-token counts.
//! 4. A token qualifies when it is at least `min_word_len` long, is not a
//!    stop word, and any of the following hold:
//!    - it appeared title-cased (`Nvidia`, 3 to 15 letters), a proper-noun
//!      candidate, regardless of frequency;
//!    - it is a known proper noun;
//!    - it occurred at least `min_word_frequency` times;
//!    - it is a special keyword occurring at least `min_special_frequency`
//!      times.
//! 5. Display casing: acronyms upper-cased, known proper nouns in their
//!    canonical form, everything else title-cased. Keys that collide after
//!    casing are merged by summing their counts.
//! 6. The result is ranked by descending count and cut to `top_keywords`.
//!    Ties keep candidate order: compound labels in table order first, then
//!    tokens in order of first occurrence in the text.

use crate::config::TrendConfig;
use crate::models::{Article, KeywordCount};
use crate::utils::upcase;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use tracing::{debug, info, instrument, warn};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").unwrap());

#[derive(Debug)]
struct CompoundMatcher {
    pattern: Regex,
    label: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct TokenStats {
    count: u32,
    title_cased: bool,
}

/// Extracts ranked keyword counts from a set of articles.
#[derive(Debug)]
pub struct KeywordExtractor {
    compounds: Vec<CompoundMatcher>,
    stop_words: HashSet<String>,
    special_keywords: HashSet<String>,
    /// lowercase form -> canonical display form
    known_proper_nouns: HashMap<String, String>,
    acronyms: HashSet<String>,
    min_word_frequency: u32,
    min_special_frequency: u32,
    min_word_len: usize,
    proper_noun_len: RangeInclusive<usize>,
    top_keywords: usize,
}

fn lowercase_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.trim().to_lowercase()).collect()
}

impl KeywordExtractor {
    /// Compile the compound table and word lists from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a compound phrase cannot be compiled into a
    /// matcher.
    pub fn new(config: &TrendConfig) -> Result<Self, regex::Error> {
        let mut compounds = Vec::with_capacity(config.compounds.len());
        for compound in &config.compounds {
            let phrase = compound.phrase.trim().to_lowercase();
            if phrase.is_empty() {
                warn!(label = %compound.label, "Ignoring compound keyword with an empty phrase");
                continue;
            }
            let pattern = RegexBuilder::new(&regex::escape(&phrase))
                .case_insensitive(true)
                .build()?;
            compounds.push(CompoundMatcher {
                pattern,
                label: compound.label.clone(),
            });
        }

        Ok(Self {
            compounds,
            stop_words: lowercase_set(&config.stop_words),
            special_keywords: lowercase_set(&config.special_keywords),
            known_proper_nouns: config
                .known_proper_nouns
                .iter()
                .map(|n| (n.trim().to_lowercase(), n.trim().to_string()))
                .collect(),
            acronyms: lowercase_set(&config.acronyms),
            min_word_frequency: config.min_word_frequency,
            min_special_frequency: config.min_special_frequency,
            min_word_len: config.min_word_len,
            proper_noun_len: config.proper_noun_min_len..=config.proper_noun_max_len,
            top_keywords: config.top_keywords,
        })
    }

    /// Rank the keywords of `articles`.
    ///
    /// An empty article list yields an empty result.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub fn extract(&self, articles: &[Article]) -> Vec<KeywordCount> {
        if articles.is_empty() {
            return Vec::new();
        }

        let mut text = articles
            .iter()
            .map(|a| format!("{} {}", a.title, a.summary))
            .join(" ");

        let mut ranked: Vec<KeywordCount> = Vec::new();
        for compound in &self.compounds {
            let hits = compound.pattern.find_iter(&text).count();
            if hits == 0 {
                continue;
            }
            text = compound.pattern.replace_all(&text, " ").into_owned();
            debug!(label = %compound.label, hits, "Folded compound keyword");
            add_count(&mut ranked, &compound.label, to_count(hits));
        }

        let (order, stats) = tally_tokens(&text, &self.proper_noun_len);
        for token in &order {
            let token_stats = stats[token];
            if self.qualifies(token, token_stats) {
                add_count(&mut ranked, &self.display(token), token_stats.count);
            }
        }

        // Stable: equal counts keep candidate order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.top_keywords);

        info!(
            keywords = ranked.len(),
            top = ranked.first().map(|k| k.keyword.as_str()).unwrap_or(""),
            "Extracted keywords"
        );
        ranked
    }

    fn qualifies(&self, token: &str, stats: TokenStats) -> bool {
        if token.len() < self.min_word_len || self.stop_words.contains(token) {
            return false;
        }
        stats.title_cased
            || self.known_proper_nouns.contains_key(token)
            || stats.count >= self.min_word_frequency
            || (stats.count >= self.min_special_frequency
                && self.special_keywords.contains(token))
    }

    fn display(&self, token: &str) -> String {
        if self.acronyms.contains(token) {
            token.to_uppercase()
        } else if let Some(canonical) = self.known_proper_nouns.get(token) {
            canonical.clone()
        } else {
            upcase(token)
        }
    }
}

fn to_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn add_count(ranked: &mut Vec<KeywordCount>, keyword: &str, count: u32) {
    match ranked.iter_mut().find(|k| k.keyword == keyword) {
        Some(existing) => existing.count = existing.count.saturating_add(count),
        None => ranked.push(KeywordCount::new(keyword, count)),
    }
}

fn is_title_case(word: &str, len: &RangeInclusive<usize>) -> bool {
    let mut chars = word.chars();
    len.contains(&word.len())
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_lowercase())
}

/// Count lowercased tokens, remembering first-occurrence order and whether
/// any occurrence was title-cased.
fn tally_tokens(
    text: &str,
    proper_noun_len: &RangeInclusive<usize>,
) -> (Vec<String>, HashMap<String, TokenStats>) {
    let mut order = Vec::new();
    let mut stats: HashMap<String, TokenStats> = HashMap::new();
    for m in WORD_RE.find_iter(text) {
        let word = m.as_str();
        let lower = word.to_ascii_lowercase();
        let title_cased = is_title_case(word, proper_noun_len);
        let entry = stats.entry(lower).or_insert_with_key(|key| {
            order.push(key.clone());
            TokenStats::default()
        });
        entry.count += 1;
        entry.title_cased |= title_cased;
    }
    (order, stats)
}
