//! Run configuration: selection thresholds, keyword rule set, and feed list.
//!
//! Every knob the pipeline consults lives in [`TrendConfig`]. Defaults are the
//! versioned constants below; an optional YAML file may override any subset
//! of fields. The keyword rule set (stop words, special keywords, known proper
//! nouns, acronyms, compound table) is plain data so tests can swap in small
//! fixtures.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Version tag of the default keyword rule set below.
pub const RULESET_VERSION: &str = "2025.1";

/// Common English function words plus domain-generic terms that never make
/// useful trend keywords.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "day", "get", "has", "him", "his", "how", "its", "may", "new", "now",
    "old", "see", "two", "way", "who", "did", "she", "use", "own", "too", "why", "yet",
    "via", "per", "off", "let", "set", "put", "say", "got", "this", "that", "with", "from",
    "have", "they", "will", "been", "were", "what", "when", "your", "more", "than", "then",
    "them", "into", "some", "like", "just", "also", "over", "only", "such", "most", "much",
    "many", "very", "each", "make", "made", "said", "says", "about", "after", "their",
    "there", "these", "those", "which", "while", "would", "could", "should", "other", "where",
    "being", "because", "before", "between", "through", "during", "first", "under", "again",
    "still", "since", "here", "does", "doing", "done", "even", "well", "back", "down", "same",
    "week", "year", "years", "today", "time", "according", "including", "across",
    "within", "without", "around", "among", "against", "whether", "another", "every", "people",
    "thing", "things", "know", "need", "want", "take", "come", "look", "next", "last", "part",
    "news", "report", "reports", "article", "read", "continue", "reading", "post",
    "technology", "technologies", "research", "researchers", "platform", "platforms",
    "company", "companies", "business", "industry", "model", "models", "system", "systems",
    "tool", "tools", "data", "service", "services", "product", "products", "feature",
    "features", "launch", "launches", "launched", "announced", "announces", "release",
    "released", "update", "updates", "users", "user", "based", "using", "help", "helps",
    "work", "works", "build", "building", "world", "market", "startup", "startups", "tech",
    "artificial", "intelligence", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday",
];

/// Known AI product and company names that qualify at a lower frequency.
pub const DEFAULT_SPECIAL_KEYWORDS: &[&str] = &[
    "chatgpt", "claude", "gemini", "llama", "copilot", "gpt", "grok", "sora", "mistral",
    "deepseek", "midjourney", "perplexity", "anthropic", "openai", "nvidia", "deepmind",
    "agents", "agent", "robotics", "chips", "chip",
];

/// Proper nouns with their canonical display casing. These qualify whenever
/// they occur, regardless of how they were cased in the source text.
pub const DEFAULT_KNOWN_PROPER_NOUNS: &[&str] = &[
    "OpenAI", "Anthropic", "Google", "Microsoft", "Nvidia", "Meta", "Amazon", "Apple",
    "DeepMind", "ChatGPT", "DeepSeek", "xAI", "Mistral", "Perplexity", "Salesforce", "Oracle",
    "Intel", "AMD", "Samsung", "Tesla", "Baidu", "Alibaba", "Tencent",
];

/// Lowercase tokens that are displayed fully upper-cased.
pub const DEFAULT_ACRONYMS: &[&str] = &[
    "ai", "gpt", "llm", "llms", "agi", "api", "gpu", "gpus", "ceo", "cto", "nlp", "amd", "ibm",
    "aws", "rag",
];

/// Multi-word phrases counted as a unit. Order matters: phrases are
/// stripped in table order, so longer phrases sharing a prefix come first.
pub const DEFAULT_COMPOUNDS: &[(&str, &str)] = &[
    ("artificial intelligence", "AI"),
    ("generative ai", "Generative AI"),
    ("machine learning", "Machine Learning"),
    ("deep learning", "Deep Learning"),
    ("large language models", "LLM"),
    ("large language model", "LLM"),
    ("neural networks", "Neural Network"),
    ("neural network", "Neural Network"),
    ("computer vision", "Computer Vision"),
    ("open source", "Open Source"),
    ("google deepmind", "Google DeepMind"),
    ("hugging face", "Hugging Face"),
    ("meta ai", "Meta AI"),
    ("gpt-4o", "GPT-4o"),
    ("gpt-5", "GPT-5"),
    ("gpt-4", "GPT-4"),
    ("claude 3.5", "Claude 3.5"),
    ("claude 3", "Claude 3"),
    ("self-driving", "Self-Driving"),
];

/// Default AI news feeds.
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("https://feeds.feedburner.com/venturebeat/SZYF", "VentureBeat"),
    (
        "https://techcrunch.com/category/artificial-intelligence/feed/",
        "TechCrunch AI",
    ),
    ("https://www.artificialintelligence-news.com/feed/", "AI News"),
    (
        "https://www.theverge.com/ai-artificial-intelligence/rss/index.xml",
        "The Verge AI",
    ),
];

/// One phrase-to-label mapping in the compound table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompoundKeyword {
    /// Lowercase literal phrase to match.
    pub phrase: String,
    /// Display label the phrase is counted under.
    pub label: String,
}

/// A feed to pull entries from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSource {
    pub url: String,
    /// Overrides the title the feed reports about itself.
    #[serde(default)]
    pub name: Option<String>,
}

/// All tunables for a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of articles in the final selection (K).
    pub target_count: usize,
    /// Selection size considered "enough" before relaxing recency (S).
    pub sufficient_count: usize,
    pub recent_window_hours: i64,
    pub older_window_hours: i64,

    /// A plain word needs this many occurrences to qualify.
    pub min_word_frequency: u32,
    /// Special keywords need only this many.
    pub min_special_frequency: u32,
    pub min_word_len: usize,
    pub proper_noun_min_len: usize,
    pub proper_noun_max_len: usize,
    pub top_keywords: usize,

    pub stop_words: Vec<String>,
    pub special_keywords: Vec<String>,
    pub known_proper_nouns: Vec<String>,
    pub acronyms: Vec<String>,
    pub compounds: Vec<CompoundKeyword>,

    pub feeds: Vec<FeedSource>,
    /// Keep only the newest N entries of each feed. Unset keeps all of them.
    pub max_entries_per_feed: Option<usize>,
    pub feed_timeout_secs: u64,
    pub feed_retries: usize,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            target_count: 15,
            sufficient_count: 10,
            recent_window_hours: 24,
            older_window_hours: 48,
            min_word_frequency: 5,
            min_special_frequency: 3,
            min_word_len: 3,
            proper_noun_min_len: 3,
            proper_noun_max_len: 15,
            top_keywords: 10,
            stop_words: owned(DEFAULT_STOP_WORDS),
            special_keywords: owned(DEFAULT_SPECIAL_KEYWORDS),
            known_proper_nouns: owned(DEFAULT_KNOWN_PROPER_NOUNS),
            acronyms: owned(DEFAULT_ACRONYMS),
            compounds: DEFAULT_COMPOUNDS
                .iter()
                .map(|(phrase, label)| CompoundKeyword {
                    phrase: phrase.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            feeds: DEFAULT_FEEDS
                .iter()
                .map(|(url, name)| FeedSource {
                    url: url.to_string(),
                    name: Some(name.to_string()),
                })
                .collect(),
            max_entries_per_feed: None,
            feed_timeout_secs: 10,
            feed_retries: 2,
        }
    }
}

impl TrendConfig {
    /// Parse a YAML document; fields it omits keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        let config: TrendConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<TrendConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!(ruleset = RULESET_VERSION, "Using built-in configuration");
        return Ok(TrendConfig::default());
    };

    let yaml = std::fs::read_to_string(path)?;
    let config = TrendConfig::from_yaml(&yaml)?;
    info!(
        path = %path.display(),
        feeds = config.feeds.len(),
        compounds = config.compounds.len(),
        "Loaded configuration"
    );
    Ok(config)
}
