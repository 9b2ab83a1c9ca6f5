//! Service configuration
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional `config.toml`, and `CAREER_RADAR__SECTION__KEY` environment
//! variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::news::{DeduplicationConfig, RelevanceFilter};

const ENV_PREFIX: &str = "CAREER_RADAR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub feeds: FeedConfig,
    #[serde(default)]
    pub deduplication: DeduplicationConfig,
    #[serde(default)]
    pub relevance: RelevanceFilter,
}

impl Config {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("config").required(false)),
        )
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(
            config::Config::builder().add_source(config::File::from(path.as_ref())),
        )
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on request bodies (plan chunks can be large)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Plan sessions held at once; the least recently used is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Plan sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8081 }
fn default_max_body_bytes() -> usize { 1024 * 1024 }
fn default_max_sessions() -> usize { 1000 }
fn default_session_idle_secs() -> u64 { 1800 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl ServerConfig {
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Streaming plan processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Maximum buffered characters; older content is dropped on overflow
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_max_buffer_size() -> usize { 50_000 }

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

/// RSS feed fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feeds polled by the news pipeline
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retry `n` (0-based) is `2^n * retry_base_delay_ms`
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_feed_urls() -> Vec<String> {
    vec![
        "https://news.google.com/rss/search?q=AI+layoffs&hl=en-US&gl=US&ceid=US:en".to_string(),
        "https://news.google.com/rss/search?q=automation+job+losses&hl=en-US&gl=US&ceid=US:en"
            .to_string(),
    ]
}
fn default_max_retries() -> u32 { 3 }
fn default_retry_base_delay_ms() -> u64 { 1000 }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_user_agent() -> String { format!("career-radar/{}", env!("CARGO_PKG_VERSION")) }
fn default_max_concurrent_fetches() -> usize { 4 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl FeedConfig {
    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
