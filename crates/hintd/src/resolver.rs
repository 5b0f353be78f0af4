//! Answer resolver: vision, then web search, then text-only, then a fixed
//! message.
//!
//! Each source either produces a non-empty answer or hands over to the next.
//! `resolve` never fails and never returns an empty string.

use crate::capture::CaptureManager;
use crate::game_context::GameContext;
use crate::llm::ModelClient;
use crate::search::{enrich_query, SearchResult, WebSearch};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NOT_FOUND_MESSAGE: &str =
    "Sorry, I couldn't find specific information for your query. Try rephrasing your question.";

pub const UNAVAILABLE_MESSAGE: &str =
    "I'm unable to process your request right now. Please check your internet connection and API keys.";

/// Page content shown in a search answer, in characters
const EXCERPT_CHARS: usize = 800;

/// Result titles listed when no page content could be fetched
const LISTED_TITLES: usize = 3;

/// A user question, trimmed and known to be non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    submitted_at: DateTime<Utc>,
}

impl Query {
    /// None for empty or whitespace-only text
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            submitted_at: Utc::now(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// Outcome of the search step
enum SearchOutcome {
    Answer(String),
    NotFound,
}

pub struct AnswerResolver {
    model: Option<Arc<dyn ModelClient>>,
    search: Option<Arc<dyn WebSearch>>,
    capture: Arc<CaptureManager>,
}

impl AnswerResolver {
    pub fn new(
        model: Option<Arc<dyn ModelClient>>,
        search: Option<Arc<dyn WebSearch>>,
        capture: Arc<CaptureManager>,
    ) -> Self {
        Self {
            model,
            search,
            capture,
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Answer `query` from the first source that produces something.
    ///
    /// Search always yields an answer once it runs: a search that finds
    /// nothing answers with the not-found message. The text-only model is
    /// reached only when search is not configured.
    pub async fn resolve(&self, query: &Query, context: &GameContext) -> String {
        if let Some(answer) = self.try_vision(query).await {
            return answer;
        }

        let game = context.current().await;

        if let Some(search) = &self.search {
            return match search_answer(search.as_ref(), query.text(), game.as_deref()).await {
                SearchOutcome::Answer(answer) => answer,
                SearchOutcome::NotFound => NOT_FOUND_MESSAGE.to_string(),
            };
        }

        if let Some(model) = &self.model {
            match model.answer_text(query.text(), game.as_deref()).await {
                Ok(answer) if !answer.trim().is_empty() => {
                    info!("Answered from text model");
                    return answer;
                }
                Ok(_) => debug!("Text model returned an empty answer"),
                Err(e) => warn!("Text model failed: {}", e),
            }
        }

        UNAVAILABLE_MESSAGE.to_string()
    }

    async fn try_vision(&self, query: &Query) -> Option<String> {
        let model = self.model.as_ref()?;
        let Some(image) = self.capture.latest().await else {
            debug!("No screenshot available for vision analysis");
            return None;
        };

        match model.analyze_image(&image.path, query.text()).await {
            Ok(answer) if !answer.trim().is_empty() => {
                info!("Answered from screenshot {}", image.path.display());
                Some(answer)
            }
            Ok(_) => {
                debug!("Vision model returned an empty answer");
                None
            }
            Err(e) => {
                warn!("Vision analysis failed: {}", e);
                None
            }
        }
    }
}

async fn search_answer(search: &dyn WebSearch, query: &str, game: Option<&str>) -> SearchOutcome {
    let enriched = enrich_query(query, game);
    let results = search.search(&enriched).await;
    let Some(top) = results.first() else {
        info!("Search found nothing for: {}", enriched);
        return SearchOutcome::NotFound;
    };

    match search.fetch_content(&top.url).await {
        Some(content) if !content.trim().is_empty() => {
            SearchOutcome::Answer(format_excerpt(&content))
        }
        _ => SearchOutcome::Answer(format_titles(&results)),
    }
}

fn format_excerpt(content: &str) -> String {
    let excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
    format!("Found helpful information:\n\n{}...", excerpt)
}

fn format_titles(results: &[SearchResult]) -> String {
    let titles: Vec<String> = results
        .iter()
        .take(LISTED_TITLES)
        .map(|r| format!("• {}", r.title))
        .collect();
    format!("Found these resources:\n{}", titles.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse_trims() {
        let query = Query::parse("  where is the key?\n").unwrap();
        assert_eq!(query.text(), "where is the key?");
        assert!(query.submitted_at() <= Utc::now());
    }

    #[test]
    fn test_query_parse_rejects_blank() {
        assert!(Query::parse("").is_none());
        assert!(Query::parse(" \t\n").is_none());
    }

    #[test]
    fn test_format_excerpt_cuts_at_800_chars() {
        let content = "ü".repeat(1_000);
        let answer = format_excerpt(&content);
        assert!(answer.starts_with("Found helpful information:\n\n"));
        assert!(answer.ends_with("..."));
        assert_eq!(answer.matches('ü').count(), 800);
    }

    #[test]
    fn test_format_titles_lists_at_most_three() {
        let results: Vec<SearchResult> = ["A", "B", "C", "D"]
            .iter()
            .map(|t| SearchResult {
                title: t.to_string(),
                url: format!("https://x.example/{}", t),
                snippet: String::new(),
            })
            .collect();
        assert_eq!(
            format_titles(&results),
            "Found these resources:\n• A\n• B\n• C"
        );
    }
}
