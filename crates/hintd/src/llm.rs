//! Vision / text model client.
//!
//! `ModelClient` is the seam the resolver and auto-analysis depend on.
//! `OpenAiClient` talks to an OpenAI-compatible chat completions endpoint;
//! `FakeModel` serves canned answers in tests.

use crate::config::LlmConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const VISION_SYSTEM_PROMPT: &str = "You are a gaming assistant AI. Analyze the provided game \
screenshot and answer the user's question.
Focus on:
- Game state and progress indicators
- UI elements, maps, minimaps
- Character status, inventory, objectives
- Mission details, timers, progress bars

Provide helpful, concise answers about game mechanics, objectives, or strategies based on \
what you can see.";

const TEXT_SYSTEM_PROMPT: &str = "You are a knowledgeable gaming assistant. Provide helpful \
hints, tips, and strategies for video games.
Focus on:
- Game mechanics and strategies
- Mission walkthroughs
- Item locations and unlock requirements
- Character builds and optimization

Be concise but thorough in your responses.";

/// Model call failures. Each one means "no answer from this source".
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Cannot read image: {0}")]
    Image(#[from] std::io::Error),
}

/// Vision and text-only analysis capabilities
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Answer `question` about the screenshot at `image`
    async fn analyze_image(&self, image: &Path, question: &str) -> Result<String, LlmError>;

    /// Answer `question` without an image, optionally told the current game
    async fn answer_text(&self, question: &str, game: Option<&str>) -> Result<String, LlmError>;
}

// ============================================================================
// OpenAI-compatible client
// ============================================================================

pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    vision_model: String,
    text_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Client when the configured key variable is set, none otherwise
    pub fn from_env(config: &LlmConfig) -> Result<Option<Self>> {
        match config.api_key() {
            Some(key) => Ok(Some(Self::new(config, key)?)),
            None => Ok(None),
        }
    }

    async fn chat(&self, model: &str, messages: Value) -> Result<String, LlmError> {
        let payload = json!({
            "model": model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        debug!("{} responded in {:.2}s", model, start.elapsed().as_secs_f64());
        extract_content(&body)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn analyze_image(&self, image: &Path, question: &str) -> Result<String, LlmError> {
        let bytes = tokio::fs::read(image).await?;
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(bytes));

        let messages = json!([
            { "role": "system", "content": VISION_SYSTEM_PROMPT },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": question },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }
        ]);
        self.chat(&self.vision_model, messages).await
    }

    async fn answer_text(&self, question: &str, game: Option<&str>) -> Result<String, LlmError> {
        let messages = json!([
            { "role": "system", "content": text_system_prompt(game) },
            { "role": "user", "content": question }
        ]);
        self.chat(&self.text_model, messages).await
    }
}

fn text_system_prompt(game: Option<&str>) -> String {
    match game {
        Some(game) => format!("{}\n\nCurrent game context: {}", TEXT_SYSTEM_PROMPT, game),
        None => TEXT_SYSTEM_PROMPT.to_string(),
    }
}

/// `choices[0].message.content` of a chat completion
fn extract_content(body: &Value) -> Result<String, LlmError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("Chat completion without message content");
            LlmError::Parse("missing choices[0].message.content".to_string())
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Fake model (testing)
// ============================================================================

/// Canned model answers with per-capability call counters.
///
/// `None` makes the capability fail with a network error.
#[derive(Clone, Default)]
pub struct FakeModel {
    vision_answer: Option<String>,
    text_answer: Option<String>,
    vision_calls: Arc<AtomicUsize>,
    text_calls: Arc<AtomicUsize>,
}

impl FakeModel {
    /// Model whose every call fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn vision(mut self, answer: &str) -> Self {
        self.vision_answer = Some(answer.to_string());
        self
    }

    pub fn text(mut self, answer: &str) -> Self {
        self.text_answer = Some(answer.to_string());
        self
    }

    pub fn vision_calls(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn analyze_image(&self, _image: &Path, _question: &str) -> Result<String, LlmError> {
        self.vision_calls.fetch_add(1, Ordering::SeqCst);
        self.vision_answer
            .clone()
            .ok_or_else(|| LlmError::Network("fake vision unavailable".to_string()))
    }

    async fn answer_text(&self, _question: &str, _game: Option<&str>) -> Result<String, LlmError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.text_answer
            .clone()
            .ok_or_else(|| LlmError::Network("fake text unavailable".to_string()))
    }
}
