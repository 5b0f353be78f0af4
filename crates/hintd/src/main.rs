//! hintd - game hint daemon
//!
//! Captures the screen in the background and answers questions about the
//! game being played over a local HTTP API.

use anyhow::Result;
use hintd::capture::{platform_strategy, CaptureManager, CaptureStrategy};
use hintd::llm::{ModelClient, OpenAiClient};
use hintd::search::{DuckDuckGoClient, WebSearch};
use hintd::server::{self, AppState};
use hintd::{Config, HintService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("hintd v{} starting", hint_shared::VERSION);

    let config = Config::load();

    let model: Option<Arc<dyn ModelClient>> = match OpenAiClient::from_env(&config.llm)? {
        Some(client) => {
            info!("Model analysis enabled ({})", config.llm.vision_model);
            Some(Arc::new(client))
        }
        None => {
            warn!(
                "{} not set - vision and text answers disabled, using web search only",
                config.llm.api_key_env
            );
            None
        }
    };

    let search: Option<Arc<dyn WebSearch>> = if config.search.enabled {
        Some(Arc::new(DuckDuckGoClient::new(&config.search)?))
    } else {
        info!("Web search disabled");
        None
    };

    let strategy = platform_strategy(&config.capture);
    info!("Capture strategy: {}", strategy.name());
    let capture = Arc::new(CaptureManager::new(config.capture.clone(), strategy));
    capture.start_continuous_capture();

    let service = Arc::new(HintService::new(Arc::clone(&capture), model, search));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down gracefully");
    };

    let result = server::run(AppState::new(service), &config.server.bind, shutdown).await;
    capture.stop_continuous_capture().await;
    result
}
