//! Configuration management for hintd.
//!
//! Loads settings from `$HINTD_CONFIG`, `./hintd.toml` or
//! `~/.config/hintd/config.toml`, falling back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding an explicit config path
pub const CONFIG_ENV: &str = "HINTD_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_PATH: &str = "hintd.toml";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind. Localhost only by default.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Screen capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between continuous captures
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum number of screenshots kept on disk
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,

    /// Screenshots older than this are removed by the periodic cleanup
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Timeout for the native capture tool
    #[serde(default = "default_native_timeout")]
    pub native_timeout_secs: u64,

    /// How long stop waits for the capture worker before aborting it
    #[serde(default = "default_stop_grace")]
    pub stop_grace_ms: u64,

    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// Scratch space for native capture artifacts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_interval() -> u64 {
    300 // 5 minutes
}

fn default_max_retained() -> usize {
    10
}

fn default_max_age() -> u64 {
    3600
}

fn default_native_timeout() -> u64 {
    10
}

fn default_stop_grace() -> u64 {
    1_000
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_retained: default_max_retained(),
            max_age_secs: default_max_age(),
            native_timeout_secs: default_native_timeout(),
            stop_grace_ms: default_stop_grace(),
            screenshot_dir: default_screenshot_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl CaptureConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn native_timeout(&self) -> Duration {
        Duration::from_secs(self.native_timeout_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Vision / text model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API root
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for screenshot analysis
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Model used for text-only answers
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_text_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_max_tokens() -> u32 {
    5_000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            vision_model: default_vision_model(),
            text_model: default_text_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// API key from the environment. Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,

    /// DuckDuckGo HTML endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_search_region")]
    pub region: String,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Character budget for extracted page text
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,
}

fn default_search_enabled() -> bool {
    true
}

fn default_search_endpoint() -> String {
    "https://duckduckgo.com/html/".to_string()
}

fn default_search_region() -> String {
    "us-en".to_string()
}

fn default_search_timeout() -> u64 {
    10
}

fn default_max_results() -> usize {
    5
}

fn default_content_chars() -> usize {
    2_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_search_enabled(),
            endpoint: default_search_endpoint(),
            region: default_search_region(),
            timeout_secs: default_search_timeout(),
            max_results: default_max_results(),
            content_chars: default_content_chars(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load config from the first readable candidate path, or return defaults
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config {}: {:#}", path.display(), e),
            }
        }
        info!("No config file found, using defaults");
        Config::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hintd").join("config.toml"));
        }
        paths
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.capture.interval_secs, 300);
        assert_eq!(config.capture.max_retained, 10);
        assert_eq!(config.capture.max_age_secs, 3600);
        assert_eq!(config.llm.vision_model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.search.timeout_secs, 10);
        assert_eq!(config.search.content_chars, 2_000);
        assert!(config.search.enabled);
    }

    #[test]
    fn test_parse_toml_partial() {
        let toml_str = r#"
[capture]
interval_secs = 30
max_retained = 3

[search]
enabled = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.capture.interval_secs, 30);
        assert_eq!(config.capture.max_retained, 3);
        assert!(!config.search.enabled);
        // Missing fields keep their defaults
        assert_eq!(config.capture.native_timeout_secs, 10);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_load_from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hintd.toml");
        fs::write(&path, "[server]\nbind = \"127.0.0.1:9999\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9999");
    }

    #[test]
    fn test_load_from_path_rejects_invalid_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hintd.toml");
        fs::write(&path, "[capture\ninterval_secs = ").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_missing_api_key_env_is_none() {
        let llm = LlmConfig {
            api_key_env: "HINTD_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(llm.api_key().is_none());
    }
}
