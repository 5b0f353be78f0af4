//! Current-game context.
//!
//! `extract_game_name` pulls a best-guess title out of free-text model output.
//! It is a heuristic: it misses stylized or non-English titles and can latch
//! onto incidental capitalized phrases. Treat the result as a hint only.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Accepted title length after trimming, in characters
const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 49;

/// Tried in order; the first in-range capture wins
static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:This is|You're playing|The game is) ([A-Za-z\s]+?)(?:\.|,|\n|$)",
        r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*) (?:game|series)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Best-guess game title in `response`, or none.
pub fn extract_game_name(response: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(response)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .find(|title| (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&title.chars().count()))
            .map(str::to_string)
    })
}

/// Shared "current game" cell.
///
/// Cloning shares the cell. Written by the auto-analysis path, read by the
/// resolver and search; readers tolerate a stale value.
#[derive(Debug, Clone, Default)]
pub struct GameContext {
    name: Arc<RwLock<Option<String>>>,
}

impl GameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<String> {
        self.name.read().await.clone()
    }

    pub async fn set(&self, name: impl Into<String>) {
        *self.name.write().await = Some(name.into());
    }

    /// Update the cell from model output. A response with no recognizable
    /// title leaves the previous value in place.
    pub async fn observe(&self, response: &str) -> Option<String> {
        let name = extract_game_name(response)?;
        info!("Detected game: {}", name);
        self.set(name.clone()).await;
        Some(name)
    }
}
