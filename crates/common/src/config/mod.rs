//! Configuration management for the ClaimForge engine
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! Scoring thresholds and penalty multipliers are not configurable here;
//! they live in [`crate::constants`] so the Scorer and Verifier can never
//! disagree about them.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Evidence gathering configuration
    #[serde(default)]
    pub gathering: GatheringConfig,

    /// Refinement loop configuration
    #[serde(default)]
    pub refinement: RefinementConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatheringConfig {
    /// Maximum pages scored concurrently
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Maximum passages extracted from a single page
    #[serde(default = "default_max_passages_per_page")]
    pub max_passages_per_page: usize,

    /// Maximum consecutive words reused verbatim in a quote
    #[serde(default = "default_max_quote_words")]
    pub max_quote_words: usize,

    /// Relative difference above which two values of one metric conflict
    #[serde(default = "default_numeric_tolerance")]
    pub numeric_tolerance: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefinementConfig {
    /// Hard cap on refine-and-reverify iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Deadline for the refinement loop in milliseconds (none = unbounded)
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Include event targets in log lines
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

// Default value functions
fn default_concurrency_limit() -> usize { 8 }
fn default_max_passages_per_page() -> usize { 3 }
fn default_max_quote_words() -> usize { 30 }
fn default_numeric_tolerance() -> f64 { 0.05 }
fn default_max_iterations() -> u32 { 2 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_with_target() -> bool { true }

impl Default for GatheringConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            max_passages_per_page: default_max_passages_per_page(),
            max_quote_words: default_max_quote_words(),
            numeric_tolerance: default_numeric_tolerance(),
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            timeout_ms: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            with_target: default_with_target(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gathering: GatheringConfig::default(),
            refinement: RefinementConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__REFINEMENT__MAX_ITERATIONS=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the refinement deadline as a Duration, if configured
    pub fn refinement_timeout(&self) -> Option<Duration> {
        self.refinement.timeout_ms.map(Duration::from_millis)
    }

}

impl GatheringConfig {
    /// Concurrent page workers, never below one
    pub fn worker_limit(&self) -> usize {
        self.concurrency_limit.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.refinement.max_iterations, 2);
        assert_eq!(config.gathering.max_quote_words, 30);
        assert!(config.refinement_timeout().is_none());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "refinement": { "max_iterations": 5, "timeout_ms": 250 } }"#,
        )
        .unwrap();
        assert_eq!(config.refinement.max_iterations, 5);
        assert_eq!(config.refinement_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.gathering.max_passages_per_page, 3);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_concurrency_floor() {
        let mut config = EngineConfig::default();
        config.gathering.concurrency_limit = 0;
        assert_eq!(config.gathering.worker_limit(), 1);
    }
}
