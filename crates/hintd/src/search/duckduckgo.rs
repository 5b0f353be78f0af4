//! DuckDuckGo HTML search client and page text extraction.

use super::{SearchError, SearchResult, WebSearch};
use crate::config::SearchConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0 Safari/537.36";

const RESULT_BASE: &str = "https://duckduckgo.com/";

/// Elements whose text never counts as page content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Search client for the DuckDuckGo HTML endpoint
pub struct DuckDuckGoClient {
    http: reqwest::Client,
    endpoint: String,
    region: String,
    max_results: usize,
    content_chars: usize,
}

impl DuckDuckGoClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            max_results: config.max_results,
            content_chars: config.content_chars,
        })
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("kl", self.region.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;
        parse_results(&html, self.max_results)
    }

    async fn try_fetch(&self, url: &str) -> Result<String, SearchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;
        let text = page_text(&html, self.content_chars);
        if text.is_empty() {
            return Err(SearchError::Parse("page has no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoClient {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        debug!("Searching: {}", query);
        match self.try_search(query).await {
            Ok(results) => {
                debug!("Search returned {} result(s)", results.len());
                results
            }
            Err(e) => {
                warn!("Search error: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_content(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Error fetching page content from {}: {}", url, e);
                None
            }
        }
    }
}

/// Parse the result list of a DuckDuckGo HTML page
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);
    let link_selector =
        Selector::parse("a.result__a").map_err(|e| SearchError::Parse(e.to_string()))?;
    let snippet_selector =
        Selector::parse(".result__snippet").map_err(|e| SearchError::Parse(e.to_string()))?;

    let mut results = Vec::new();
    for link in document.select(&link_selector) {
        if results.len() >= max_results {
            break;
        }

        let Some(url) = link.value().attr("href").and_then(resolve_result_url) else {
            continue;
        };
        let title = collapse_whitespace(&link.text().collect::<String>());
        if title.is_empty() {
            continue;
        }

        let snippet = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().classes().any(|class| class == "result"))
            .and_then(|container| container.select(&snippet_selector).next())
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Search result: {}", title));

        results.push(SearchResult {
            title,
            url,
            snippet,
        });
    }
    Ok(results)
}

/// Turn a result href into the target URL.
///
/// Redirect links (`/l/?uddg=<target>`) are unwrapped; other links back into
/// DuckDuckGo are dropped.
fn resolve_result_url(href: &str) -> Option<String> {
    let base = Url::parse(RESULT_BASE).ok()?;
    let url = base.join(href.trim()).ok()?;

    let target = if url.path().starts_with("/l/") {
        url.query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())?
    } else {
        url.to_string()
    };

    let parsed = Url::parse(&target).ok()?;
    let internal = parsed
        .host_str()
        .map(|host| host == "duckduckgo.com" || host.ends_with(".duckduckgo.com"))
        .unwrap_or(true);
    if internal || !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(target)
}

/// Visible text of an HTML page: script and style dropped, markup stripped,
/// whitespace collapsed, cut to `max_chars` characters.
pub fn page_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    let collapsed = collapse_whitespace(&raw);
    collapsed.chars().take(max_chars).collect::<String>().trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
