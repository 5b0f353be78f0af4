//! Hint service: the state shared by every request handler.
//!
//! Owns the capture manager, the game context and the resolver. Handlers go
//! through this type only, so there is no module-level state.

use crate::capture::{CaptureError, CaptureManager, CapturedImage};
use crate::game_context::GameContext;
use crate::llm::ModelClient;
use crate::resolver::{AnswerResolver, Query};
use crate::search::WebSearch;
use hint_shared::{HealthResponse, StatusResponse};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Question asked about every manual capture
pub const AUTO_ANALYSIS_PROMPT: &str =
    "What game is this? What is the current objective or mission?";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Failed to capture screenshot: {0}")]
    Capture(#[from] CaptureError),
}

/// Receives the result of each auto-analysis
pub trait AnalysisObserver: Send + Sync {
    fn on_analysis(&self, response: &str, game: Option<&str>);
}

/// Default observer: log lines only
pub struct LogObserver;

impl AnalysisObserver for LogObserver {
    fn on_analysis(&self, response: &str, game: Option<&str>) {
        let preview: String = response.chars().take(100).collect();
        match game {
            Some(game) => info!("Auto-analysis complete for {}: {}...", game, preview),
            None => info!("Auto-analysis complete, game unknown: {}...", preview),
        }
    }
}

pub struct HintService {
    capture: Arc<CaptureManager>,
    context: GameContext,
    resolver: AnswerResolver,
    model: Option<Arc<dyn ModelClient>>,
    observer: Arc<dyn AnalysisObserver>,
}

impl HintService {
    pub fn new(
        capture: Arc<CaptureManager>,
        model: Option<Arc<dyn ModelClient>>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        let resolver = AnswerResolver::new(model.clone(), search, Arc::clone(&capture));
        Self {
            capture,
            context: GameContext::new(),
            resolver,
            model,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn capture(&self) -> &Arc<CaptureManager> {
        &self.capture
    }

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn llm_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Answer a raw question. Blank input is the only error.
    pub async fn resolve_query(&self, raw: &str) -> Result<String, ServiceError> {
        let query = Query::parse(raw).ok_or(ServiceError::EmptyQuery)?;
        info!("Processing query: {}", query.text());
        Ok(self.resolver.resolve(&query, &self.context).await)
    }

    /// Capture now. With a model configured, the new screenshot is analyzed
    /// in a detached task that updates the game context.
    pub async fn manual_capture(&self) -> Result<CapturedImage, ServiceError> {
        let image = self.capture.capture_once().await?;

        match &self.model {
            Some(model) => {
                let model = Arc::clone(model);
                let context = self.context.clone();
                let observer = Arc::clone(&self.observer);
                let path = image.path.clone();
                tokio::spawn(async move {
                    auto_analyze(model.as_ref(), &path, &context, observer.as_ref()).await;
                });
            }
            None => debug!("No model configured, skipping auto-analysis"),
        }
        Ok(image)
    }

    pub async fn status(&self) -> StatusResponse {
        StatusResponse {
            screenshot_count: self.capture.count().await,
            llm_enabled: self.llm_enabled(),
            current_game: self.context.current().await,
            capturing: self.capture.is_capturing(),
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            llm_enabled: self.llm_enabled(),
        }
    }
}

/// Ask the model what game the screenshot shows and record the title.
///
/// Failures are logged and leave the context unchanged.
pub async fn auto_analyze(
    model: &dyn ModelClient,
    image: &Path,
    context: &GameContext,
    observer: &dyn AnalysisObserver,
) -> Option<String> {
    debug!("Auto-analyzing {}", image.display());
    let response = match model.analyze_image(image, AUTO_ANALYSIS_PROMPT).await {
        Ok(response) if !response.trim().is_empty() => response,
        Ok(_) => {
            warn!("Auto-analysis returned no response");
            return None;
        }
        Err(e) => {
            warn!("Auto-analysis failed: {}", e);
            return None;
        }
    };

    let game = context.observe(&response).await;
    observer.on_analysis(&response, game.as_deref());
    game
}
