//! Configuration management for the citation pipeline
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/*.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Claim detector configuration
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Query formulator configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Search provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Relevance ranker configuration
    #[serde(default)]
    pub ranker: RankerConfig,

    /// Streaming orchestrator configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Citation cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Confidence threshold separating needs_citation true/false
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Minimum sentence length in characters; shorter fragments are dropped
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Maximum number of terms per query
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,

    /// Minimum terms kept in the broadened secondary query
    #[serde(default = "default_broad_min_terms")]
    pub broad_min_terms: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Search API base URL
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Optional API credential; absence lowers the allowed request rate
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for rate-limited responses
    #[serde(default = "default_provider_retries")]
    pub max_retries: u32,

    /// Initial backoff interval in milliseconds
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Allowed requests per second with an API key
    #[serde(default = "default_rps_with_key")]
    pub requests_per_second_with_key: u32,

    /// Allowed requests per second without an API key
    #[serde(default = "default_rps_without_key")]
    pub requests_per_second_without_key: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankerConfig {
    /// Results kept per query after ranking
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum primary results before the broad query's results are merged in
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    /// Horizon in years over which the recency factor decays to zero
    #[serde(default = "default_recency_horizon")]
    pub recency_horizon_years: u32,

    /// How many candidates to request from the provider per query
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Concurrent per-sentence search chains
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Bounded pending-emission buffer size
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Per-sentence deadline in seconds
    #[serde(default = "default_sentence_timeout")]
    pub sentence_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum cached (paper id, style) entries per run
    #[serde(default = "default_cache_capacity")]
    pub citation_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,
}

// Default value functions
fn default_confidence_threshold() -> f32 { 0.2 }
fn default_min_sentence_chars() -> usize { 20 }
fn default_max_terms() -> usize { 8 }
fn default_broad_min_terms() -> usize { 3 }
fn default_provider_base_url() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}
fn default_provider_timeout() -> u64 { 10 }
fn default_provider_retries() -> u32 { 3 }
fn default_backoff_initial_ms() -> u64 { 500 }
fn default_rps_with_key() -> u32 { 10 }
fn default_rps_without_key() -> u32 { 1 }
fn default_top_k() -> usize { 5 }
fn default_min_results() -> usize { 3 }
fn default_recency_horizon() -> u32 { 10 }
fn default_fetch_limit() -> usize { 15 }
fn default_concurrency() -> usize { 4 }
fn default_event_buffer() -> usize { 16 }
fn default_sentence_timeout() -> u64 { 20 }
fn default_cache_capacity() -> usize { 256 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }

impl PipelineConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__ORCHESTRATOR__CONCURRENCY=8
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Per-request provider timeout as Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    /// Per-sentence deadline as Duration
    pub fn sentence_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator.sentence_timeout_secs)
    }

    /// Initial retry backoff as Duration
    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.provider.backoff_initial_ms)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            min_sentence_chars: default_min_sentence_chars(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_terms: default_max_terms(),
            broad_min_terms: default_broad_min_terms(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: None,
            timeout_secs: default_provider_timeout(),
            max_retries: default_provider_retries(),
            backoff_initial_ms: default_backoff_initial_ms(),
            requests_per_second_with_key: default_rps_with_key(),
            requests_per_second_without_key: default_rps_without_key(),
        }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_results: default_min_results(),
            recency_horizon_years: default_recency_horizon(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            event_buffer: default_event_buffer(),
            sentence_timeout_secs: default_sentence_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            citation_capacity: default_cache_capacity(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            query: QueryConfig::default(),
            provider: ProviderConfig::default(),
            ranker: RankerConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
