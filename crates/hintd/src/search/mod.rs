//! Web search for game hints.
//!
//! `enrich_query` biases a question toward guides; a `WebSearch`
//! implementation runs it and extracts page text. Every failure degrades to
//! "no results" / "no content" so the resolver can move on.

pub mod duckduckgo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

pub use duckduckgo::DuckDuckGoClient;

/// Terms that already make a query guide-oriented
const GAMING_TERMS: &[&str] = &["guide", "walkthrough", "tips", "how to", "strategy"];

const GAMING_SUFFIX: &str = " guide walkthrough tips";

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Search failures. Logged, never surfaced to users.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Prefix the known game and append guide terms when none are present.
pub fn enrich_query(query: &str, game: Option<&str>) -> String {
    let mut enriched = match game.map(str::trim).filter(|g| !g.is_empty()) {
        Some(game) => format!("{} {}", game, query),
        None => query.to_string(),
    };

    let lower = query.to_lowercase();
    if !GAMING_TERMS.iter().any(|term| lower.contains(term)) {
        enriched.push_str(GAMING_SUFFIX);
    }
    enriched
}

/// Search capability used by the resolver
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Top results for an already-enriched query; empty on any failure
    async fn search(&self, query: &str) -> Vec<SearchResult>;

    /// Plain text of a page, truncated; none on any failure
    async fn fetch_content(&self, url: &str) -> Option<String>;
}

// ============================================================================
// Fake search (testing)
// ============================================================================

/// Canned search backend with call counters
#[derive(Clone, Default)]
pub struct FakeSearch {
    results: Vec<SearchResult>,
    content: Option<String>,
    queries: Arc<Mutex<Vec<String>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl FakeSearch {
    /// Backend that finds nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Backend returning one result per title
    pub fn with_titles(titles: &[&str]) -> Self {
        let results = titles
            .iter()
            .enumerate()
            .map(|(i, title)| SearchResult {
                title: title.to_string(),
                url: format!("https://guides.example/{}", i),
                snippet: format!("Search result: {}", title),
            })
            .collect();
        Self {
            results,
            ..Self::default()
        }
    }

    /// Page text returned by `fetch_content`
    pub fn content(mut self, text: &str) -> Self {
        self.content = Some(text.to_string());
        self
    }

    pub fn search_calls(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Queries received, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        self.results.clone()
    }

    async fn fetch_content(&self, url: &str) -> Option<String> {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(url.to_string());
        }
        self.content.clone()
    }
}
